//! Pipeline stages
//!
//! Each stage knows which program it runs and which targets it touches. The
//! pipeline calls them in a fixed order and threads each stage's output
//! target into the next one explicitly.

mod cascade;
mod cursor;
mod distance;
mod jump_flood;
mod paint;
mod seed;

pub use cascade::CascadeStage;
pub use cursor::CursorStage;
pub use distance::DistanceStage;
pub use jump_flood::JumpFloodStage;
pub use paint::PaintStage;
pub use seed::SeedStage;

use std::collections::HashSet;

use log::debug;

use crate::target::{DrawTarget, TargetId};
use crate::{Error, Result};

/// Common surface of every stage
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Declare the targets this stage samples and draws into
    fn declare_resources(&self, resources: &mut StageResources);
}

/// Reads and writes declared by one stage
#[derive(Debug, Default, Clone)]
pub struct StageResources {
    reads: Vec<TargetId>,
    writes: Vec<DrawTarget>,
}

impl StageResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&mut self, target: TargetId) -> &mut Self {
        self.reads.push(target);
        self
    }

    pub fn write(&mut self, target: DrawTarget) -> &mut Self {
        self.writes.push(target);
        self
    }

    pub fn reads(&self) -> &[TargetId] {
        &self.reads
    }

    pub fn writes(&self) -> &[DrawTarget] {
        &self.writes
    }
}

/// Check that every stage only samples targets an earlier stage produced,
/// or targets that persist across frames.
pub fn validate_stage_order(stages: &[&dyn Stage]) -> Result<()> {
    let mut produced: HashSet<TargetId> = HashSet::new();
    for (index, stage) in stages.iter().enumerate() {
        let mut resources = StageResources::new();
        stage.declare_resources(&mut resources);

        for &read in resources.reads() {
            if !read.is_persistent() && !produced.contains(&read) {
                return Err(Error::setup(
                    format!("stage '{}'", stage.name()),
                    format!("samples '{}' before any stage draws it", read.name()),
                ));
            }
        }
        for &write in resources.writes() {
            if let DrawTarget::Offscreen(id) = write {
                produced.insert(id);
            }
        }
        debug!(
            "Stage {}: {} (reads {}, writes {})",
            index,
            stage.name(),
            resources.reads().len(),
            resources.writes().len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        reads: Vec<TargetId>,
        writes: Vec<TargetId>,
    }

    impl Stage for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn declare_resources(&self, resources: &mut StageResources) {
            for &read in &self.reads {
                resources.read(read);
            }
            for &write in &self.writes {
                resources.write(DrawTarget::Offscreen(write));
            }
        }
    }

    #[test]
    fn consumer_before_producer_is_rejected() {
        let consumer = Fixed {
            name: "distance",
            reads: vec![TargetId::FloodA],
            writes: vec![TargetId::DistanceField],
        };
        let producer = Fixed {
            name: "flood",
            reads: vec![],
            writes: vec![TargetId::FloodA],
        };
        assert!(validate_stage_order(&[&producer, &consumer]).is_ok());
        assert!(validate_stage_order(&[&consumer, &producer]).is_err());
    }

    #[test]
    fn persistent_targets_need_no_producer() {
        let stage = Fixed {
            name: "cascade",
            reads: vec![TargetId::Canvas, TargetId::LastFrame],
            writes: vec![],
        };
        assert!(validate_stage_order(&[&stage]).is_ok());
    }
}
