//! Shader modules, layouts and the render pipeline cache

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, trace};
use penumbra_core::{BlendMode, Error, ProgramDesc, ProgramId, Result, Sampling, ShaderStage};

use crate::geometry::QuadMesh;

const VERTEX_SHADER: &str = include_str!("../shaders/fullscreen.wgsl");

fn fragment_source(program: ProgramId) -> &'static str {
    match program {
        ProgramId::Paint => include_str!("../shaders/paint.wgsl"),
        ProgramId::Seed => include_str!("../shaders/seed.wgsl"),
        ProgramId::JumpFlood => include_str!("../shaders/jump_flood.wgsl"),
        ProgramId::DistanceField => include_str!("../shaders/distance.wgsl"),
        ProgramId::Cascade => include_str!("../shaders/cascade.wgsl"),
        ProgramId::Cursor => include_str!("../shaders/cursor.wgsl"),
    }
}

/// Binding number of an input's texture. Binding 0 is the uniform block.
pub fn texture_binding(slot_index: usize) -> u32 {
    1 + 2 * slot_index as u32
}

/// Binding number of an input's sampler, present for filtered inputs only
pub fn sampler_binding(slot_index: usize) -> u32 {
    2 + 2 * slot_index as u32
}

/// Key for pipeline cache lookup
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct PipelineKey {
    pub program: ProgramId,
    pub format: wgpu::TextureFormat,
}

struct ProgramLayout {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

/// Compiled programs and the pipelines built from them
pub struct ProgramLibrary {
    device: Arc<wgpu::Device>,
    vertex: wgpu::ShaderModule,
    fragments: HashMap<ProgramId, wgpu::ShaderModule>,
    layouts: HashMap<ProgramId, ProgramLayout>,
    pipelines: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

fn compile_module(
    device: &wgpu::Device,
    program: &'static str,
    stage: ShaderStage,
    source: &'static str,
) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(Error::Compile {
            program,
            stage,
            diagnostic: err.to_string(),
        }),
        None => Ok(module),
    }
}

fn layout_entries(desc: &ProgramDesc) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(desc.params.size()),
        },
        count: None,
    }];
    for (index, input) in desc.inputs.iter().enumerate() {
        let filtered = input.sampling == Sampling::Filtered;
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding(index),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: filtered },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        if filtered {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: sampler_binding(index),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
    }
    entries
}

impl ProgramLibrary {
    /// Compile every program. Any diagnostic is fatal.
    pub fn new(device: Arc<wgpu::Device>) -> Result<Self> {
        let vertex = compile_module(&device, "fullscreen", ShaderStage::Vertex, VERTEX_SHADER)?;

        let mut fragments = HashMap::new();
        let mut layouts = HashMap::new();
        for program in ProgramId::ALL {
            let desc = program.desc();
            let module = compile_module(
                &device,
                desc.name,
                ShaderStage::Fragment,
                fragment_source(program),
            )?;
            fragments.insert(program, module);

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.name),
                entries: &layout_entries(desc),
            });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.name),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            layouts.insert(
                program,
                ProgramLayout {
                    bind_group_layout,
                    pipeline_layout,
                },
            );
            info!("Compiled program '{}' ({})", desc.name, desc.fragment);
        }

        Ok(Self {
            device,
            vertex,
            fragments,
            layouts,
            pipelines: HashMap::new(),
        })
    }

    pub fn bind_group_layout(&self, program: ProgramId) -> Result<&wgpu::BindGroupLayout> {
        self.layouts
            .get(&program)
            .map(|layout| &layout.bind_group_layout)
            .ok_or_else(|| Error::setup(format!("program '{}'", program.name()), "no layout"))
    }

    /// Get or create the pipeline drawing `program` into a `format` target
    pub fn get_or_create(
        &mut self,
        program: ProgramId,
        format: wgpu::TextureFormat,
    ) -> Result<Arc<wgpu::RenderPipeline>> {
        let key = PipelineKey { program, format };
        if let Some(pipeline) = self.pipelines.get(&key) {
            trace!("Using cached pipeline: {:?}", key);
            return Ok(pipeline.clone());
        }

        info!("Creating pipeline variant: {:?}", key);
        let desc = program.desc();
        let (Some(fragment), Some(layout)) = (self.fragments.get(&program), self.layouts.get(&program))
        else {
            return Err(Error::setup(format!("program '{}'", desc.name), "not compiled"));
        };

        let blend = match desc.blend {
            BlendMode::AlphaOver => Some(wgpu::BlendState::ALPHA_BLENDING),
            // Float32 targets are not blendable at all
            BlendMode::Replace => None,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.name),
            layout: Some(&layout.pipeline_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: Some("vs_main"),
                buffers: &[QuadMesh::vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(Error::Compile {
                program: desc.name,
                stage: ShaderStage::Link,
                diagnostic: err.to_string(),
            });
        }

        let pipeline = Arc::new(pipeline);
        self.pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Build every variant up front so the first frame never compiles
    pub fn precompile(
        &mut self,
        variants: impl IntoIterator<Item = (ProgramId, wgpu::TextureFormat)>,
    ) -> Result<()> {
        for (program, format) in variants {
            self.get_or_create(program, format)?;
        }
        info!("{} pipeline variants ready", self.pipelines.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_layout_matches_shader_bindings() {
        let entries = layout_entries(ProgramId::Cascade.desc());
        let bindings: Vec<u32> = entries.iter().map(|e| e.binding).collect();
        // uniforms, canvas, distance, last cascade + sampler, last frame
        assert_eq!(bindings, vec![0, 1, 3, 5, 6, 7]);
    }

    #[test]
    fn overlay_layouts_are_uniforms_only() {
        for program in [ProgramId::Paint, ProgramId::Cursor] {
            let entries = layout_entries(program.desc());
            assert_eq!(entries.len(), 1);
            assert!(matches!(
                entries[0].ty,
                wgpu::BindingType::Buffer {
                    has_dynamic_offset: true,
                    ..
                }
            ));
        }
    }

    #[test]
    fn every_program_has_wgsl_source() {
        for program in ProgramId::ALL {
            let source = fragment_source(program);
            assert!(source.contains("fn fs_main"), "{:?}", program);
        }
        assert!(VERTEX_SHADER.contains("fn vs_main"));
    }
}
