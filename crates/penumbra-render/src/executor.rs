//! wgpu implementation of the pass executor

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use penumbra_core::{
    DrawTarget, Error, FramePlan, InputSlot, PassExecutor, PassInvocation, ProgramId, Result,
    Sampling, TargetId, TargetLoad,
};

use crate::geometry::QuadMesh;
use crate::programs::{sampler_binding, texture_binding, ProgramLibrary};
use crate::targets::RenderTargetSet;
use crate::uniforms::UniformArena;

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct BindGroupKey {
    program: ProgramId,
    inputs: Vec<(InputSlot, TargetId)>,
}

impl BindGroupKey {
    fn new(pass: &PassInvocation) -> Self {
        let mut inputs: Vec<_> = pass.inputs.iter().map(|i| (i.slot, i.target)).collect();
        inputs.sort();
        Self {
            program: pass.program,
            inputs,
        }
    }
}

/// Bind groups keyed by program and bound targets.
///
/// The ping-pong pairs only ever produce a handful of combinations, so
/// after the first frame every lookup is a hit.
#[derive(Default)]
pub struct BindGroupCache {
    groups: HashMap<BindGroupKey, Arc<wgpu::BindGroup>>,
}

impl BindGroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Create the bind groups for every pass in `plan`, surfacing any
    /// validation error as a setup failure
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        programs: &ProgramLibrary,
        targets: &RenderTargetSet,
        uniforms: &UniformArena,
        plan: &FramePlan,
    ) -> Result<()> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        for pass in plan.passes() {
            self.get_or_create(device, programs, targets, uniforms, pass)?;
        }
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(Error::setup("bind groups", err));
        }
        debug!("{} bind groups prepared", self.groups.len());
        Ok(())
    }

    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        programs: &ProgramLibrary,
        targets: &RenderTargetSet,
        uniforms: &UniformArena,
        pass: &PassInvocation,
    ) -> Result<Arc<wgpu::BindGroup>> {
        let key = BindGroupKey::new(pass);
        if let Some(group) = self.groups.get(&key) {
            return Ok(group.clone());
        }

        let desc = pass.program.desc();
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: uniforms.buffer(),
                offset: 0,
                size: wgpu::BufferSize::new(desc.params.size()),
            }),
        }];
        for (index, input) in desc.inputs.iter().enumerate() {
            let bound = pass
                .inputs
                .iter()
                .find(|i| i.slot.index() == index)
                .ok_or(Error::Binding {
                    program: desc.name,
                    input: input.name,
                })?;
            let target = targets.get(bound.target)?;
            entries.push(wgpu::BindGroupEntry {
                binding: texture_binding(index),
                resource: wgpu::BindingResource::TextureView(&target.view),
            });
            if input.sampling == Sampling::Filtered {
                entries.push(wgpu::BindGroupEntry {
                    binding: sampler_binding(index),
                    resource: wgpu::BindingResource::Sampler(&target.sampler),
                });
            }
        }

        let group = Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.name),
            layout: programs.bind_group_layout(pass.program)?,
            entries: &entries,
        }));
        self.groups.insert(key, group.clone());
        Ok(group)
    }
}

/// The texture a frame is presented from
pub struct FrameTarget<'a> {
    pub texture: &'a wgpu::Texture,
    pub view: &'a wgpu::TextureView,
}

/// Records passes into one command encoder
pub struct WgpuPassExecutor<'a> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub targets: &'a RenderTargetSet,
    pub programs: &'a mut ProgramLibrary,
    pub bind_groups: &'a mut BindGroupCache,
    pub uniforms: &'a mut UniformArena,
    pub quad: &'a QuadMesh,
    pub screen: FrameTarget<'a>,
}

fn load_op(load: TargetLoad) -> wgpu::LoadOp<wgpu::Color> {
    match load {
        TargetLoad::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        TargetLoad::Preserve => wgpu::LoadOp::Load,
    }
}

impl PassExecutor for WgpuPassExecutor<'_> {
    fn run_pass(&mut self, pass: &PassInvocation) -> Result<()> {
        let targets = self.targets;
        let (view, format) = match pass.target {
            DrawTarget::Offscreen(id) => {
                let target = targets.get(id)?;
                (&target.view, target.format)
            }
            DrawTarget::Screen => (self.screen.view, self.screen.texture.format()),
        };

        let pipeline = self.programs.get_or_create(pass.program, format)?;
        let desc = pass.program.desc();
        let offset = self.uniforms.push(&desc.params.pack(desc.name, &pass.params))?;
        let bind_group = self.bind_groups.get_or_create(
            self.device,
            self.programs,
            targets,
            self.uniforms,
            pass,
        )?;

        let mut render_pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op(pass.load),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&pipeline);
        render_pass.set_bind_group(0, &*bind_group, &[offset]);
        self.quad.draw(&mut render_pass);
        Ok(())
    }

    fn copy_to_target(&mut self, source: DrawTarget, destination: TargetId) -> Result<()> {
        let targets = self.targets;
        let src = match source {
            DrawTarget::Offscreen(id) => &targets.get(id)?.texture,
            DrawTarget::Screen => self.screen.texture,
        };
        let dst = &targets.get(destination)?.texture;
        if src.format() != dst.format() {
            warn!(
                "Skipping copy {} -> {}: {:?} vs {:?}",
                source.name(),
                destination.name(),
                src.format(),
                dst.format()
            );
            return Ok(());
        }
        let extent = wgpu::Extent3d {
            width: src.width().min(dst.width()),
            height: src.height().min(dst.height()),
            depth_or_array_layers: 1,
        };
        self.encoder
            .copy_texture_to_texture(src.as_image_copy(), dst.as_image_copy(), extent);
        Ok(())
    }
}
