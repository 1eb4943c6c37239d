use glam::Vec2;
use log::trace;

use super::{Stage, StageResources};
use crate::executor::{PassExecutor, PassInvocation, TextureInput};
use crate::params::ParamBlock;
use crate::ping_pong::PingPong;
use crate::program::{BindingTable, InputSlot, ProgramId};
use crate::schedule::{jfa_offsets, jfa_pass_count};
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{PipelineConfig, Result};

/// Propagates nearest-seed coordinates with halving offsets over the flood
/// ping-pong pair
#[derive(Debug, Clone)]
pub struct JumpFloodStage {
    previous: InputSlot,
    resolution: Vec2,
    pass_count: u32,
    buffers: PingPong<TargetId>,
}

impl JumpFloodStage {
    pub fn new(config: &PipelineConfig, bindings: &BindingTable) -> Result<Self> {
        Ok(Self {
            previous: bindings.slot(ProgramId::JumpFlood, "previous")?,
            resolution: config.resolution(),
            pass_count: jfa_pass_count(config.width, config.height),
            buffers: PingPong::new(TargetId::FloodA, TargetId::FloodB),
        })
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    /// Run every iteration starting from `seed` and return the target that
    /// holds the final result
    pub fn record(&mut self, seed: TargetId, executor: &mut dyn PassExecutor) -> Result<TargetId> {
        self.buffers.reset();
        let mut source = seed;
        for offset in jfa_offsets(self.pass_count) {
            let target = self.buffers.write();
            trace!("jump_flood: offset {} {} -> {}", offset, source.name(), target.name());
            executor.run_pass(&PassInvocation {
                label: "jump_flood",
                program: ProgramId::JumpFlood,
                target: DrawTarget::Offscreen(target),
                inputs: vec![TextureInput::new(self.previous, source)],
                params: ParamBlock::new()
                    .with("resolution", self.resolution)
                    .with("offset", offset as i32),
                load: TargetLoad::TRANSPARENT,
            })?;
            self.buffers.swap();
            source = self.buffers.read();
        }
        // A 1x1 canvas needs no flooding; its seed is already final
        Ok(source)
    }
}

impl Stage for JumpFloodStage {
    fn name(&self) -> &'static str {
        "jump_flood"
    }

    fn declare_resources(&self, resources: &mut StageResources) {
        resources.read(TargetId::Seed);
        for target in self.buffers.buffers() {
            resources.write(DrawTarget::Offscreen(target));
        }
    }
}
