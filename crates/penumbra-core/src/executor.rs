//! The seam between pass orchestration and a rendering backend

use std::collections::BTreeSet;

use log::trace;

use crate::params::ParamBlock;
use crate::program::{InputSlot, ProgramId};
use crate::target::{DrawTarget, TargetId, TargetLoad};
use crate::{Error, Result};

/// A texture bound to one input slot of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInput {
    pub slot: InputSlot,
    pub target: TargetId,
}

impl TextureInput {
    pub fn new(slot: InputSlot, target: TargetId) -> Self {
        Self { slot, target }
    }
}

/// One full-screen draw
#[derive(Debug, Clone, PartialEq)]
pub struct PassInvocation {
    pub label: &'static str,
    pub program: ProgramId,
    pub target: DrawTarget,
    pub inputs: Vec<TextureInput>,
    pub params: ParamBlock,
    pub load: TargetLoad,
}

impl PassInvocation {
    pub fn reads(&self, target: TargetId) -> bool {
        self.inputs.iter().any(|input| input.target == target)
    }

    pub fn input(&self, slot: InputSlot) -> Option<TargetId> {
        self.inputs
            .iter()
            .find(|input| input.slot == slot)
            .map(|input| input.target)
    }
}

/// Executes passes against real render targets.
///
/// Implementations bind the draw target (clearing it or not per
/// [`PassInvocation::load`]), bind every input texture to its slot, upload
/// the parameters and draw the full-screen quad.
pub trait PassExecutor {
    fn run_pass(&mut self, pass: &PassInvocation) -> Result<()>;

    /// Copy a finished draw target into an off-screen target
    fn copy_to_target(&mut self, source: DrawTarget, destination: TargetId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedStep {
    Pass(PassInvocation),
    Copy {
        source: DrawTarget,
        destination: TargetId,
    },
}

/// Executor that records a frame instead of drawing it.
///
/// Used at setup to validate the frame and to learn which programs are
/// drawn into which targets before anything hits the GPU.
#[derive(Debug, Clone, Default)]
pub struct FramePlan {
    steps: Vec<PlannedStep>,
}

impl FramePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn passes(&self) -> impl Iterator<Item = &PassInvocation> {
        self.steps.iter().filter_map(|step| match step {
            PlannedStep::Pass(pass) => Some(pass),
            PlannedStep::Copy { .. } => None,
        })
    }

    /// Distinct (program, draw target) pairs, in a stable order
    pub fn program_targets(&self) -> BTreeSet<(ProgramId, DrawTarget)> {
        self.passes()
            .map(|pass| (pass.program, pass.target))
            .collect()
    }

    /// Reject any pass that samples the target it draws into
    pub fn validate(&self) -> Result<()> {
        for pass in self.passes() {
            if let DrawTarget::Offscreen(target) = pass.target {
                if pass.reads(target) {
                    return Err(Error::Feedback {
                        pass: pass.label,
                        target: target.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl PassExecutor for FramePlan {
    fn run_pass(&mut self, pass: &PassInvocation) -> Result<()> {
        trace!("plan: {} -> {}", pass.label, pass.target.name());
        self.steps.push(PlannedStep::Pass(pass.clone()));
        Ok(())
    }

    fn copy_to_target(&mut self, source: DrawTarget, destination: TargetId) -> Result<()> {
        self.steps.push(PlannedStep::Copy {
            source,
            destination,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BindingTable;

    fn flood_pass(read: TargetId, write: TargetId) -> PassInvocation {
        let table = BindingTable::new();
        PassInvocation {
            label: "jump_flood",
            program: ProgramId::JumpFlood,
            target: DrawTarget::Offscreen(write),
            inputs: vec![TextureInput::new(
                table.slot(ProgramId::JumpFlood, "previous").unwrap(),
                read,
            )],
            params: ParamBlock::new(),
            load: TargetLoad::TRANSPARENT,
        }
    }

    #[test]
    fn plan_records_passes_and_copies() {
        let mut plan = FramePlan::new();
        plan.run_pass(&flood_pass(TargetId::FloodA, TargetId::FloodB)).unwrap();
        plan.copy_to_target(DrawTarget::Screen, TargetId::LastFrame).unwrap();

        assert_eq!(plan.steps().len(), 2);
        assert_eq!(plan.passes().count(), 1);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn feedback_loop_is_rejected() {
        let mut plan = FramePlan::new();
        plan.run_pass(&flood_pass(TargetId::FloodA, TargetId::FloodA)).unwrap();
        assert!(matches!(
            plan.validate(),
            Err(Error::Feedback {
                pass: "jump_flood",
                target: "flood_a"
            })
        ));
    }

    #[test]
    fn program_targets_are_deduplicated() {
        let mut plan = FramePlan::new();
        plan.run_pass(&flood_pass(TargetId::Seed, TargetId::FloodB)).unwrap();
        plan.run_pass(&flood_pass(TargetId::FloodB, TargetId::FloodA)).unwrap();
        plan.run_pass(&flood_pass(TargetId::FloodA, TargetId::FloodB)).unwrap();
        assert_eq!(plan.program_targets().len(), 2);
    }
}
