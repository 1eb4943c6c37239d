//! Main renderer

use std::sync::Arc;

use glam::Vec2;
use log::{info, warn};
use penumbra_core::{
    ClickState, DrawTarget, FrameInput, Pipeline, PipelineConfig, ProgramId, Result,
};

use crate::executor::{BindGroupCache, FrameTarget, WgpuPassExecutor};
use crate::geometry::QuadMesh;
use crate::programs::ProgramLibrary;
use crate::targets::RenderTargetSet;
use crate::uniforms::UniformArena;

/// Renderer configuration
pub struct RendererConfig {
    pub pipeline: PipelineConfig,
    /// Format of the textures passed to [`Renderer::render`]
    pub surface_format: wgpu::TextureFormat,
    /// Whether frame textures carry `COPY_SRC`; temporal feedback needs it
    pub screen_copyable: bool,
}

/// Owns every GPU resource of the pipeline and draws one frame per call
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: Pipeline,
    targets: RenderTargetSet,
    programs: ProgramLibrary,
    bind_groups: BindGroupCache,
    uniforms: UniformArena,
    quad: QuadMesh,
    size_warned: bool,
}

impl Renderer {
    /// Create every target, compile every program and build the pipeline
    /// variants one frame needs. Nothing here is retried; any error means
    /// the frame loop must not start.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: RendererConfig,
    ) -> Result<Self> {
        info!("Creating Penumbra renderer");
        info!("  Surface format: {:?}", config.surface_format);
        info!(
            "  Resolution: {}x{}",
            config.pipeline.width, config.pipeline.height
        );

        let mut pipeline_config = config.pipeline;
        if pipeline_config.temporal_feedback && !config.screen_copyable {
            warn!("Frame texture cannot be copied from; temporal feedback disabled");
            pipeline_config.temporal_feedback = false;
        }

        let pipeline = Pipeline::new(pipeline_config)?;
        let targets = RenderTargetSet::new(&device, &pipeline.target_descs(), config.surface_format)?;
        let mut programs = ProgramLibrary::new(device.clone())?;
        let quad = QuadMesh::new(&device);

        let plan = pipeline.plan_frame(&FrameInput::click_at(Vec2::ZERO, ClickState::Primary))?;
        let mut variants: Vec<(ProgramId, wgpu::TextureFormat)> = Vec::new();
        for (program, target) in plan.program_targets() {
            let format = match target {
                DrawTarget::Offscreen(id) => targets.get(id)?.format,
                DrawTarget::Screen => config.surface_format,
            };
            variants.push((program, format));
        }
        programs.precompile(variants)?;

        let uniforms = UniformArena::new(&device, plan.passes().count() as u32);
        let mut bind_groups = BindGroupCache::new();
        bind_groups.prepare(&device, &programs, &targets, &uniforms, &plan)?;

        info!(
            "Renderer ready: {} passes per frame, {} bind groups",
            plan.passes().count(),
            bind_groups.len()
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            targets,
            programs,
            bind_groups,
            uniforms,
            quad,
            size_warned: false,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Draw one frame into `target` and submit it
    pub fn render(&mut self, input: &FrameInput, target: &wgpu::Texture) -> Result<()> {
        let config = self.pipeline.config();
        if !self.size_warned && (target.width(), target.height()) != (config.width, config.height) {
            warn!(
                "Frame texture is {}x{}, canvas is {}x{}",
                target.width(),
                target.height(),
                config.width,
                config.height
            );
            self.size_warned = true;
        }

        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Penumbra Frame Encoder"),
            });

        self.uniforms.begin_frame();
        {
            let mut executor = WgpuPassExecutor {
                device: &self.device,
                encoder: &mut encoder,
                targets: &self.targets,
                programs: &mut self.programs,
                bind_groups: &mut self.bind_groups,
                uniforms: &mut self.uniforms,
                quad: &self.quad,
                screen: FrameTarget {
                    texture: target,
                    view: &view,
                },
            };
            self.pipeline.run_frame(input, &mut executor)?;
        }
        self.uniforms.flush(&self.queue);
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
