//! Penumbra wgpu backend
//!
//! Implements the pass executor from `penumbra-core` on top of wgpu: one
//! texture per render target, one WGSL fragment program per stage, one
//! command encoder per frame.

mod executor;
mod geometry;
mod programs;
mod renderer;
mod targets;
mod uniforms;

pub use executor::{BindGroupCache, FrameTarget, WgpuPassExecutor};
pub use geometry::QuadMesh;
pub use programs::{PipelineKey, ProgramLibrary};
pub use renderer::{Renderer, RendererConfig};
pub use targets::{create_target, resolve_format, GpuTarget, RenderTargetSet};
pub use uniforms::UniformArena;

pub use penumbra_core as core;
