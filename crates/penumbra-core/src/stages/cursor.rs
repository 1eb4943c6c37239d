use glam::Vec2;
use log::trace;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation};
use crate::input::FrameInput;
use crate::params::ParamBlock;
use crate::program::ProgramId;
use crate::target::{DrawTarget, TargetLoad};
use crate::{PipelineConfig, Result};

/// Draws the brush outline over the lit frame.
///
/// Runs after the last-frame copy, so the outline is never fed back into
/// the next frame's lighting.
#[derive(Debug, Clone)]
pub struct CursorStage {
    resolution: Vec2,
    brush_radius: f32,
}

impl CursorStage {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            resolution: config.resolution(),
            brush_radius: config.brush_radius,
        }
    }

    pub fn record(&self, input: &FrameInput, executor: &mut dyn PassExecutor) -> Result<()> {
        trace!("cursor: ring at {}", input.cursor);
        executor.run_pass(&PassInvocation {
            label: "cursor",
            program: ProgramId::Cursor,
            target: DrawTarget::Screen,
            inputs: Vec::new(),
            params: ParamBlock::new()
                .with("resolution", self.resolution)
                .with("mouse", input.cursor)
                .with("brush_radius", self.brush_radius),
            load: TargetLoad::Preserve,
        })
    }
}

impl Stage for CursorStage {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        resources.write(DrawTarget::Screen);
    }
}
