//! Renders a few scripted strokes on the CPU backend and saves the result
//!
//! Usage: `headless_render [output.png] [size]`

use glam::Vec2;
use penumbra_core::{ClickState, Error, FrameInput, PipelineConfig, Result};
use penumbra_soft::SoftRenderer;

/// (from, to, button) in NDC
const STROKES: &[(Vec2, Vec2, ClickState)] = &[
    (Vec2::new(-0.6, 0.5), Vec2::new(-0.4, 0.5), ClickState::Primary),
    (Vec2::new(0.3, -0.6), Vec2::new(0.5, -0.6), ClickState::Primary),
    (Vec2::new(-0.1, -0.3), Vec2::new(-0.1, 0.4), ClickState::Secondary),
    (Vec2::new(0.2, 0.2), Vec2::new(0.6, 0.2), ClickState::Secondary),
];

fn run(path: &str, size: u32) -> Result<()> {
    let config = PipelineConfig::default()
        .with_size(size, size)
        .with_brush_radius(size as f32 / 64.0);
    let mut renderer = SoftRenderer::new(config)?;

    for &(from, to, click) in STROKES {
        // Walk the stroke in small steps like a dragged cursor would
        let steps = 8;
        for i in 0..steps {
            let a = from.lerp(to, i as f32 / steps as f32);
            let b = from.lerp(to, (i + 1) as f32 / steps as f32);
            renderer.render(&FrameInput::stroke(a, b, click))?;
        }
    }
    renderer.render(&FrameInput::idle())?;

    let screen = renderer.screen();
    image::save_buffer(
        path,
        &screen.to_rgba8(),
        screen.width(),
        screen.height(),
        image::ColorType::Rgba8,
    )
    .map_err(|e| Error::setup(path, e))?;
    log::info!(
        "Wrote {} ({} frames)",
        path,
        renderer.pipeline().frame_index()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "radiance_cascades.png".to_string());
    let size = match args.next().map(|s| s.parse::<u32>()) {
        None => 256,
        Some(Ok(size)) => size,
        Some(Err(e)) => {
            log::error!("Invalid size: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&path, size) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
