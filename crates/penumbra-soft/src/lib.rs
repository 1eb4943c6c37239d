//! Penumbra software backend
//!
//! Runs the same frame as the wgpu backend, pixel by pixel on the CPU.
//! Targets keep the precision of their GPU formats, so results track the
//! GPU closely. Used for headless rendering and for testing the pipeline
//! without a device.

mod buffer;
mod executor;
mod programs;

pub use buffer::PixelBuffer;
pub use executor::SoftExecutor;
pub use programs::{BoundInputs, Shader};

use log::info;
use penumbra_core::{FrameInput, Pipeline, PipelineConfig, Result, TargetId};

pub use penumbra_core as core;

/// A pipeline bound to a [`SoftExecutor`]
pub struct SoftRenderer {
    pipeline: Pipeline,
    executor: SoftExecutor,
}

impl SoftRenderer {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let pipeline = Pipeline::new(config)?;
        let config = pipeline.config();
        let executor = SoftExecutor::new(&pipeline.target_descs(), config.width, config.height);
        info!(
            "Soft renderer ready: {}x{}, {} flood passes, {} cascade levels",
            config.width,
            config.height,
            pipeline.jfa_pass_count(),
            pipeline.cascade_count() + 1
        );
        Ok(Self { pipeline, executor })
    }

    pub fn render(&mut self, input: &FrameInput) -> Result<()> {
        self.pipeline.run_frame(input, &mut self.executor)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn executor(&self) -> &SoftExecutor {
        &self.executor
    }

    /// The last composited frame
    pub fn screen(&self) -> &PixelBuffer {
        self.executor.screen()
    }

    pub fn target(&self, id: TargetId) -> Option<&PixelBuffer> {
        self.executor.target(id)
    }
}
