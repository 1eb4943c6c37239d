use glam::{Vec2, Vec4};
use log::trace;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation, TextureInput};
use crate::params::ParamBlock;
use crate::ping_pong::PingPong;
use crate::program::{BindingTable, InputSlot, ProgramId};
use crate::schedule::{cascade_count, cascade_levels};
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{PipelineConfig, Result};

#[derive(Debug, Clone, Copy)]
struct CascadeInputs {
    canvas: InputSlot,
    distance: InputSlot,
    last_cascade: InputSlot,
    last_frame: InputSlot,
}

/// Accumulates radiance from the coarsest cascade down to level 0.
///
/// Every level above 0 draws into the cascade ping-pong pair and reads the
/// level before it from the other buffer. Level 0 draws straight to the
/// screen; the brush outline goes on top later, in [`CursorStage`].
///
/// [`CursorStage`]: super::CursorStage
#[derive(Debug, Clone)]
pub struct CascadeStage {
    inputs: CascadeInputs,
    resolution: Vec2,
    ambient: Vec4,
    base_ray_count: u32,
    cascade_count: u32,
    temporal_weight: f32,
    max_steps: u32,
    buffers: PingPong<TargetId>,
}

impl CascadeStage {
    pub fn new(config: &PipelineConfig, bindings: &BindingTable) -> Result<Self> {
        let slot = |name| bindings.slot(ProgramId::Cascade, name);
        Ok(Self {
            inputs: CascadeInputs {
                canvas: slot("canvas")?,
                distance: slot("distance")?,
                last_cascade: slot("last_cascade")?,
                last_frame: slot("last_frame")?,
            },
            resolution: config.resolution(),
            ambient: config.ambient_rgba(),
            base_ray_count: config.base_ray_count,
            cascade_count: cascade_count(config.width, config.height, config.base_ray_count),
            temporal_weight: if config.temporal_feedback {
                config.temporal_weight
            } else {
                0.0
            },
            max_steps: config.max_march_steps,
            buffers: PingPong::new(TargetId::CascadeA, TargetId::CascadeB),
        })
    }

    /// Index of the coarsest level
    pub fn cascade_count(&self) -> u32 {
        self.cascade_count
    }

    pub fn record(&mut self, distance: TargetId, executor: &mut dyn PassExecutor) -> Result<()> {
        self.buffers.reset();
        for level in cascade_levels(self.cascade_count) {
            let (target, load) = if level == 0 {
                (DrawTarget::Screen, TargetLoad::OPAQUE_BLACK)
            } else {
                (DrawTarget::Offscreen(self.buffers.write()), TargetLoad::TRANSPARENT)
            };
            // The coarsest level binds the stale buffer but never merges it
            let last_cascade = self.buffers.read();
            trace!("cascade: level {} -> {}", level, target.name());

            executor.run_pass(&PassInvocation {
                label: "cascade",
                program: ProgramId::Cascade,
                target,
                inputs: vec![
                    TextureInput::new(self.inputs.canvas, TargetId::Canvas),
                    TextureInput::new(self.inputs.distance, distance),
                    TextureInput::new(self.inputs.last_cascade, last_cascade),
                    TextureInput::new(self.inputs.last_frame, TargetId::LastFrame),
                ],
                params: self.level_params(level),
                load,
            })?;

            if level > 0 {
                self.buffers.swap();
            }
        }
        Ok(())
    }

    fn level_params(&self, level: u32) -> ParamBlock {
        ParamBlock::new()
            .with("resolution", self.resolution)
            .with("ambient", self.ambient)
            .with("base_ray_count", self.base_ray_count as i32)
            .with("cascade_index", level as i32)
            .with("cascade_count", self.cascade_count as i32)
            .with("temporal_weight", self.temporal_weight)
            .with("max_steps", self.max_steps as i32)
    }
}

impl Stage for CascadeStage {
    fn name(&self) -> &'static str {
        "cascade"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        resources
            .read(TargetId::Canvas)
            .read(TargetId::DistanceField)
            .read(TargetId::LastFrame);
        for target in self.buffers.buffers() {
            resources.write(DrawTarget::Offscreen(target));
        }
        resources.write(DrawTarget::Screen);
    }
}
