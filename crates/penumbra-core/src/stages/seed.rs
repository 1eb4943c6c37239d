use glam::Vec2;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation, TextureInput};
use crate::params::ParamBlock;
use crate::program::{BindingTable, InputSlot, ProgramId};
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{PipelineConfig, Result};

/// Turns occupied canvas pixels into flood-fill seeds holding their own
/// coordinate
#[derive(Debug, Clone)]
pub struct SeedStage {
    canvas: InputSlot,
    resolution: Vec2,
    threshold: f32,
}

impl SeedStage {
    pub fn new(config: &PipelineConfig, bindings: &BindingTable) -> Result<Self> {
        Ok(Self {
            canvas: bindings.slot(ProgramId::Seed, "canvas")?,
            resolution: config.resolution(),
            threshold: config.seed_threshold,
        })
    }

    /// Returns the seed target
    pub fn record(&self, executor: &mut dyn PassExecutor) -> Result<TargetId> {
        executor.run_pass(&PassInvocation {
            label: "seed",
            program: ProgramId::Seed,
            target: DrawTarget::Offscreen(TargetId::Seed),
            inputs: vec![TextureInput::new(self.canvas, TargetId::Canvas)],
            params: ParamBlock::new()
                .with("resolution", self.resolution)
                .with("threshold", self.threshold),
            load: TargetLoad::TRANSPARENT,
        })?;
        Ok(TargetId::Seed)
    }
}

impl Stage for SeedStage {
    fn name(&self) -> &'static str {
        "seed"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        resources
            .read(TargetId::Canvas)
            .write(DrawTarget::Offscreen(TargetId::Seed));
    }
}
