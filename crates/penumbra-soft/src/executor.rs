//! Software pass executor

use glam::{Vec2, Vec4, Vec4Swizzles};
use log::{debug, trace};
use penumbra_core::{
    BlendMode, DrawTarget, Error, FilterMode, PassExecutor, PassInvocation, PixelFormat,
    RenderTargetDesc, Result, TargetId, TargetLoad,
};

use crate::buffer::PixelBuffer;
use crate::programs::{BoundInputs, Shader};

/// `ALPHA_BLENDING`: colour over with src alpha, alpha with one
fn alpha_over(src: Vec4, dst: Vec4) -> Vec4 {
    let rgb = src.xyz() * src.w + dst.xyz() * (1.0 - src.w);
    let a = src.w + dst.w * (1.0 - src.w);
    rgb.extend(a)
}

/// Runs passes on the CPU against one [`PixelBuffer`] per render target
#[derive(Debug, Clone)]
pub struct SoftExecutor {
    targets: Vec<Option<PixelBuffer>>,
    screen: PixelBuffer,
    passes_run: u64,
}

impl SoftExecutor {
    pub fn new(descs: &[RenderTargetDesc], width: u32, height: u32) -> Self {
        let mut targets: Vec<Option<PixelBuffer>> = vec![None; TargetId::ALL.len()];
        for desc in descs {
            debug!(
                "Soft target '{}': {}x{} {:?}",
                desc.name(),
                desc.width,
                desc.height,
                desc.format
            );
            targets[desc.id.slot()] = Some(PixelBuffer::from_desc(desc));
        }
        Self {
            targets,
            screen: PixelBuffer::new(width, height, PixelFormat::Presentation, FilterMode::Nearest),
            passes_run: 0,
        }
    }

    pub fn target(&self, id: TargetId) -> Option<&PixelBuffer> {
        self.targets.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn screen(&self) -> &PixelBuffer {
        &self.screen
    }

    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    fn missing(id: TargetId) -> Error {
        Error::setup(format!("render target '{}'", id.name()), "not created")
    }

    /// Take the draw target out so inputs can be borrowed alongside it
    fn take_target(&mut self, target: DrawTarget) -> Result<PixelBuffer> {
        match target {
            DrawTarget::Screen => Ok(std::mem::replace(
                &mut self.screen,
                PixelBuffer::new(0, 0, PixelFormat::Presentation, FilterMode::Nearest),
            )),
            DrawTarget::Offscreen(id) => self
                .targets
                .get_mut(id.slot())
                .and_then(Option::take)
                .ok_or_else(|| Self::missing(id)),
        }
    }

    fn put_target(&mut self, target: DrawTarget, buffer: PixelBuffer) {
        match target {
            DrawTarget::Screen => self.screen = buffer,
            DrawTarget::Offscreen(id) => self.targets[id.slot()] = Some(buffer),
        }
    }

    fn draw(&self, pass: &PassInvocation, output: &mut PixelBuffer) -> Result<()> {
        let desc = pass.program.desc();
        let mut textures: Vec<Option<&PixelBuffer>> = vec![None; desc.inputs.len()];
        for input in &pass.inputs {
            let Some(buffer) = self.target(input.target) else {
                // The draw target is taken out for the pass
                return Err(if pass.target == DrawTarget::Offscreen(input.target) {
                    Error::Feedback {
                        pass: pass.label,
                        target: input.target.name(),
                    }
                } else {
                    Self::missing(input.target)
                });
            };
            if let Some(slot) = textures.get_mut(input.slot.index()) {
                *slot = Some(buffer);
            }
        }
        let shader = Shader::prepare(pass, &BoundInputs::new(pass.program, textures))?;

        if let TargetLoad::Clear(color) = pass.load {
            output.fill(Vec4::from_array(color));
        }
        for y in 0..output.height() {
            for x in 0..output.width() {
                let frag = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let src = shader.shade(frag);
                let color = match desc.blend {
                    BlendMode::Replace => src,
                    BlendMode::AlphaOver => alpha_over(src, output.get(x, y)),
                };
                output.set(x, y, color);
            }
        }
        Ok(())
    }
}

impl PassExecutor for SoftExecutor {
    fn run_pass(&mut self, pass: &PassInvocation) -> Result<()> {
        trace!("soft: {} -> {}", pass.label, pass.target.name());
        // A pass reading its own target finds it missing and fails in draw
        let mut output = self.take_target(pass.target)?;
        let result = self.draw(pass, &mut output);
        self.put_target(pass.target, output);
        self.passes_run += 1;
        result
    }

    fn copy_to_target(&mut self, source: DrawTarget, destination: TargetId) -> Result<()> {
        trace!("soft: copy {} -> {}", source.name(), destination.name());
        let mut output = self.take_target(DrawTarget::Offscreen(destination))?;
        let result = match source {
            DrawTarget::Screen => {
                output.copy_from(&self.screen);
                Ok(())
            }
            DrawTarget::Offscreen(id) => match self.target(id) {
                Some(buffer) => {
                    output.copy_from(buffer);
                    Ok(())
                }
                None => Err(Self::missing(id)),
            },
        };
        self.put_target(DrawTarget::Offscreen(destination), output);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_core::{ParamBlock, PipelineConfig, ProgramId, TextureInput};

    fn executor(size: u32) -> SoftExecutor {
        let config = PipelineConfig::default().with_size(size, size);
        SoftExecutor::new(&penumbra_core::render_target_descs(&config), size, size)
    }

    #[test]
    fn alpha_over_keeps_opaque_destination_alpha() {
        let out = alpha_over(Vec4::new(1.0, 0.0, 0.0, 0.5), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(out, Vec4::new(0.5, 0.0, 0.5, 1.0));
    }

    #[test]
    fn clear_load_fills_the_target() {
        let mut exec = executor(4);
        let pass = PassInvocation {
            label: "distance",
            program: ProgramId::DistanceField,
            target: DrawTarget::Offscreen(TargetId::DistanceField),
            inputs: vec![TextureInput::new(
                penumbra_core::BindingTable::new()
                    .slot(ProgramId::DistanceField, "flood")
                    .unwrap(),
                TargetId::FloodA,
            )],
            params: ParamBlock::new().with("resolution", Vec2::splat(4.0)),
            load: TargetLoad::TRANSPARENT,
        };
        exec.run_pass(&pass).unwrap();
        let distance = exec.target(TargetId::DistanceField).unwrap();
        assert!(distance.pixels().iter().all(|p| *p == Vec4::ONE));
    }

    #[test]
    fn reading_the_draw_target_is_rejected() {
        let mut exec = executor(4);
        let slot = penumbra_core::BindingTable::new()
            .slot(ProgramId::JumpFlood, "previous")
            .unwrap();
        let pass = PassInvocation {
            label: "jump_flood",
            program: ProgramId::JumpFlood,
            target: DrawTarget::Offscreen(TargetId::FloodA),
            inputs: vec![TextureInput::new(slot, TargetId::FloodA)],
            params: ParamBlock::new()
                .with("resolution", Vec2::splat(4.0))
                .with("offset", 1),
            load: TargetLoad::TRANSPARENT,
        };
        assert!(matches!(exec.run_pass(&pass), Err(Error::Feedback { .. })));
        // The target survives the failed pass
        assert!(exec.target(TargetId::FloodA).is_some());
    }

    #[test]
    fn absent_input_is_a_setup_error_not_feedback() {
        let config = PipelineConfig::default().with_size(4, 4);
        let descs: Vec<RenderTargetDesc> = penumbra_core::render_target_descs(&config)
            .into_iter()
            .filter(|desc| desc.id != TargetId::FloodA)
            .collect();
        let mut exec = SoftExecutor::new(&descs, 4, 4);
        let slot = penumbra_core::BindingTable::new()
            .slot(ProgramId::DistanceField, "flood")
            .unwrap();
        let pass = PassInvocation {
            label: "distance",
            program: ProgramId::DistanceField,
            target: DrawTarget::Offscreen(TargetId::DistanceField),
            inputs: vec![TextureInput::new(slot, TargetId::FloodA)],
            params: ParamBlock::new().with("resolution", Vec2::splat(4.0)),
            load: TargetLoad::TRANSPARENT,
        };
        let err = exec.run_pass(&pass).unwrap_err();
        assert!(matches!(err, Error::Setup { .. }), "{err}");
        assert!(err.to_string().contains("flood_a"));
        assert!(exec.target(TargetId::DistanceField).is_some());
    }

    #[test]
    fn copy_requantizes_into_the_destination() {
        let mut exec = executor(2);
        exec.copy_to_target(DrawTarget::Screen, TargetId::LastFrame)
            .unwrap();
        assert_eq!(exec.target(TargetId::LastFrame).unwrap().get(1, 1), Vec4::ZERO);
    }
}
