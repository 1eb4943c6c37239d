//! Frame orchestration

use glam::Vec2;
use log::{debug, info};

use crate::executor::{FramePlan, PassExecutor};
use crate::input::{ClickState, FrameInput};
use crate::program::BindingTable;
use crate::stages::{
    validate_stage_order, CascadeStage, CursorStage, DistanceStage, JumpFloodStage, PaintStage,
    SeedStage, Stage,
};
use crate::target::{render_target_descs, DrawTarget, RenderTargetDesc, TargetId};
use crate::{PipelineConfig, Result};

/// The fixed paint → seed → flood → distance → cascade → cursor pipeline.
///
/// Holds no GPU state; every frame is expressed as a sequence of
/// [`PassInvocation`](crate::PassInvocation)s handed to a [`PassExecutor`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    bindings: BindingTable,
    paint: PaintStage,
    seed: SeedStage,
    flood: JumpFloodStage,
    distance: DistanceStage,
    cascade: CascadeStage,
    cursor: CursorStage,
    frame_index: u64,
}

impl Pipeline {
    /// Validate `config`, build every stage and dry-run one frame.
    ///
    /// Any binding or feedback problem surfaces here, before a backend
    /// allocates anything.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let bindings = BindingTable::new();

        let pipeline = Self {
            paint: PaintStage::new(&config),
            seed: SeedStage::new(&config, &bindings)?,
            flood: JumpFloodStage::new(&config, &bindings)?,
            distance: DistanceStage::new(&config, &bindings)?,
            cascade: CascadeStage::new(&config, &bindings)?,
            cursor: CursorStage::new(&config),
            bindings,
            config,
            frame_index: 0,
        };

        validate_stage_order(&pipeline.stages())?;
        let plan = pipeline.plan_frame(&FrameInput::click_at(Vec2::ZERO, ClickState::Primary))?;
        plan.validate()?;

        info!(
            "Pipeline ready: {}x{}, {} flood passes, cascades {}..0, {} draws per painting frame",
            pipeline.config.width,
            pipeline.config.height,
            pipeline.flood.pass_count(),
            pipeline.cascade.cascade_count(),
            plan.passes().count()
        );
        Ok(pipeline)
    }

    fn stages(&self) -> [&dyn Stage; 6] {
        [
            &self.paint,
            &self.seed,
            &self.flood,
            &self.distance,
            &self.cascade,
            &self.cursor,
        ]
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Descriptions of every render target a backend must create
    pub fn target_descs(&self) -> Vec<RenderTargetDesc> {
        render_target_descs(&self.config)
    }

    pub fn jfa_pass_count(&self) -> u32 {
        self.flood.pass_count()
    }

    pub fn cascade_count(&self) -> u32 {
        self.cascade.cascade_count()
    }

    /// Frames submitted so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Record the passes one frame would issue, without touching any state
    pub fn plan_frame(&self, input: &FrameInput) -> Result<FramePlan> {
        let mut plan = FramePlan::new();
        self.clone().run_frame(input, &mut plan)?;
        Ok(plan)
    }

    /// Issue every pass for one frame, in dependency order
    pub fn run_frame(&mut self, input: &FrameInput, executor: &mut dyn PassExecutor) -> Result<()> {
        self.paint.record(input, executor)?;
        let seed = self.seed.record(executor)?;
        let flood = self.flood.record(seed, executor)?;
        let distance = self.distance.record(flood, executor)?;
        self.cascade.record(distance, executor)?;

        // Copy before the cursor so the brush outline never feeds back
        if self.config.temporal_feedback {
            executor.copy_to_target(DrawTarget::Screen, TargetId::LastFrame)?;
        }
        self.cursor.record(input, executor)?;

        if self.frame_index == 0 {
            debug!("First frame recorded (final flood target: {})", flood.name());
        }
        self.frame_index += 1;
        Ok(())
    }
}
