use glam::{Vec2, Vec4};
use log::trace;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation};
use crate::input::{ClickState, FrameInput};
use crate::params::ParamBlock;
use crate::program::ProgramId;
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{PipelineConfig, Result};

/// Composites the current brush stroke into the canvas.
///
/// The canvas is never cleared, so strokes accumulate for the lifetime of
/// the run.
#[derive(Debug, Clone)]
pub struct PaintStage {
    resolution: Vec2,
    brush_radius: f32,
    light: Vec4,
    wall: Vec4,
}

impl PaintStage {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            resolution: config.resolution(),
            brush_radius: config.brush_radius,
            light: config.light_color.extend(1.0),
            wall: config.wall_color.extend(1.0),
        }
    }

    fn brush_color(&self, click: ClickState) -> Vec4 {
        match click {
            ClickState::Secondary => self.wall,
            _ => self.light,
        }
    }

    pub fn record(&self, input: &FrameInput, executor: &mut dyn PassExecutor) -> Result<()> {
        if !input.click.is_painting() {
            trace!("paint: idle");
            return Ok(());
        }
        let params = ParamBlock::new()
            .with("resolution", self.resolution)
            .with("mouse", input.cursor)
            .with("last_mouse", input.last_cursor)
            .with("click", input.click.as_i32())
            .with("brush_radius", self.brush_radius)
            .with("brush_color", self.brush_color(input.click));

        executor.run_pass(&PassInvocation {
            label: "paint",
            program: ProgramId::Paint,
            target: DrawTarget::Offscreen(TargetId::Canvas),
            inputs: Vec::new(),
            params,
            load: TargetLoad::Preserve,
        })
    }
}

impl Stage for PaintStage {
    fn name(&self) -> &'static str {
        "paint"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        resources.write(DrawTarget::Offscreen(TargetId::Canvas));
    }
}
