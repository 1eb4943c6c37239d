//! Penumbra core - pass orchestration for 2D radiance cascades
//!
//! This crate knows the shape of a frame but never touches a GPU:
//!
//! - **Targets**: the fixed set of off-screen render targets and their formats
//! - **Programs**: the shading programs, their inputs and uniform layouts
//! - **Stages**: paint, seed, jump flood, distance field, radiance cascades
//!   and the cursor overlay
//! - **Pipeline**: runs the stages in order against any [`PassExecutor`]
//!
//! Backends (`penumbra-render` for wgpu, `penumbra-soft` on the CPU)
//! implement [`PassExecutor`] and create the targets described by
//! [`Pipeline::target_descs`].

pub mod config;
pub mod error;
pub mod executor;
pub mod frame;
pub mod input;
pub mod params;
pub mod ping_pong;
pub mod pipeline;
pub mod program;
pub mod quad;
pub mod schedule;
pub mod stages;
pub mod target;

pub use config::PipelineConfig;
pub use error::{Error, Result, ShaderStage};
pub use executor::{FramePlan, PassExecutor, PassInvocation, PlannedStep, TextureInput};
pub use frame::FpsCounter;
pub use input::{ndc_to_pixel, ClickState, FrameInput, InputState, MouseButton};
pub use params::{ParamBlock, ParamKind, ParamLayout, ParamValue};
pub use ping_pong::PingPong;
pub use pipeline::Pipeline;
pub use program::{BindingTable, BlendMode, InputSlot, ProgramDesc, ProgramId, Sampling};
pub use quad::{QuadVertex, QUAD_INDICES, QUAD_VERTICES};
pub use target::{
    render_target_descs, DrawTarget, FilterMode, PixelFormat, RenderTargetDesc, TargetId,
    TargetLoad,
};
