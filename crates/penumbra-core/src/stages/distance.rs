use glam::Vec2;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation, TextureInput};
use crate::params::ParamBlock;
use crate::program::{BindingTable, InputSlot, ProgramId};
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{PipelineConfig, Result};

/// Converts the flooded seed map into a normalized distance field
#[derive(Debug, Clone)]
pub struct DistanceStage {
    flood: InputSlot,
    resolution: Vec2,
}

impl DistanceStage {
    pub fn new(config: &PipelineConfig, bindings: &BindingTable) -> Result<Self> {
        Ok(Self {
            flood: bindings.slot(ProgramId::DistanceField, "flood")?,
            resolution: config.resolution(),
        })
    }

    pub fn record(&self, flood: TargetId, executor: &mut dyn PassExecutor) -> Result<TargetId> {
        executor.run_pass(&PassInvocation {
            label: "distance_field",
            program: ProgramId::DistanceField,
            target: DrawTarget::Offscreen(TargetId::DistanceField),
            inputs: vec![TextureInput::new(self.flood, flood)],
            params: ParamBlock::new().with("resolution", self.resolution),
            load: TargetLoad::TRANSPARENT,
        })?;
        Ok(TargetId::DistanceField)
    }
}

impl Stage for DistanceStage {
    fn name(&self) -> &'static str {
        "distance_field"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        // Whichever flood buffer finished last
        resources
            .read(TargetId::FloodA)
            .read(TargetId::FloodB)
            .write(DrawTarget::Offscreen(TargetId::DistanceField));
    }
}
