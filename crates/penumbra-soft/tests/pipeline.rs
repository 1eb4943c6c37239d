use glam::{Vec2, Vec4, Vec4Swizzles};
use penumbra_core::{
    BindingTable, ClickState, DrawTarget, FrameInput, ParamBlock, PassExecutor, PassInvocation,
    PipelineConfig, ProgramId, TargetId, TargetLoad, TextureInput,
};
use penumbra_soft::{PixelBuffer, SoftRenderer};

const EIGHT_BIT: f32 = 0.005;

fn renderer(size: u32) -> SoftRenderer {
    SoftRenderer::new(PipelineConfig::default().with_size(size, size).with_brush_radius(3.0))
        .expect("valid config")
}

/// NDC of the centre of pixel (x, y), row 0 at the top
fn pixel_centre(x: u32, y: u32, size: u32) -> Vec2 {
    let s = size as f32;
    Vec2::new(
        (x as f32 + 0.5) / s * 2.0 - 1.0,
        1.0 - (y as f32 + 0.5) / s * 2.0,
    )
}

fn assert_close(actual: Vec4, expected: Vec4, tolerance: f32) {
    let diff = (actual - expected).abs().max_element();
    assert!(
        diff <= tolerance,
        "expected {expected:?}, got {actual:?} (off by {diff})"
    );
}

/// Flood target the distance pass reads for `input`
fn final_flood(renderer: &SoftRenderer, input: &FrameInput) -> TargetId {
    let plan = renderer.pipeline().plan_frame(input).unwrap();
    let slot = BindingTable::new()
        .slot(ProgramId::DistanceField, "flood")
        .unwrap();
    let target = plan
        .passes()
        .find(|pass| pass.program == ProgramId::DistanceField)
        .and_then(|pass| pass.input(slot))
        .unwrap();
    target
}

#[test]
fn empty_canvas_is_lit_by_ambient_only() {
    let mut renderer = renderer(32);
    renderer.render(&FrameInput::idle()).unwrap();

    let distance = renderer.target(TargetId::DistanceField).unwrap();
    assert!(distance.pixels().iter().all(|p| *p == Vec4::ONE));

    let ambient = renderer.pipeline().config().ambient_rgba();
    for pixel in renderer.screen().pixels() {
        assert!(!pixel.is_nan());
        assert_close(*pixel, ambient.xyz().extend(1.0), EIGHT_BIT);
    }
}

#[test]
fn painted_mark_survives_idle_frames() {
    let size = 16;
    let mut renderer = renderer(size);
    renderer
        .render(&FrameInput::click_at(Vec2::ZERO, ClickState::Primary))
        .unwrap();

    let canvas = renderer.target(TargetId::Canvas).unwrap();
    let mark = canvas.get(8, 8);
    assert!(mark.w > 0.0);
    let before: Vec<Vec4> = canvas.pixels().to_vec();

    for _ in 0..100 {
        renderer.render(&FrameInput::idle()).unwrap();
    }

    let canvas = renderer.target(TargetId::Canvas).unwrap();
    assert_eq!(canvas.get(8, 8), mark);
    assert_eq!(canvas.pixels(), before.as_slice());
    assert_eq!(renderer.pipeline().frame_index(), 101);
}

#[test]
fn strokes_accumulate_on_the_canvas() {
    let size = 32;
    let mut renderer = renderer(size);
    let left = pixel_centre(8, 16, size);
    let right = pixel_centre(24, 16, size);
    renderer
        .render(&FrameInput::click_at(left, ClickState::Primary))
        .unwrap();
    renderer
        .render(&FrameInput::click_at(right, ClickState::Secondary))
        .unwrap();

    let config = renderer.pipeline().config();
    let light = config.light_color;
    let canvas = renderer.target(TargetId::Canvas).unwrap();
    assert_close(canvas.get(8, 16), light.extend(1.0), EIGHT_BIT);
    assert_close(canvas.get(24, 16), config.wall_color.extend(1.0), EIGHT_BIT);
    // Untouched between the two dabs
    assert_eq!(canvas.get(16, 16).w, 0.0);
}

#[test]
fn light_pixel_shows_its_own_colour() {
    let size = 16;
    let mut renderer = renderer(size);
    renderer
        .render(&FrameInput::click_at(Vec2::ZERO, ClickState::Primary))
        .unwrap();
    renderer.render(&FrameInput::idle()).unwrap();

    let light = renderer.pipeline().config().light_color;
    assert_close(renderer.screen().get(8, 8), light.extend(1.0), 2.0 * EIGHT_BIT);
}

#[test]
fn flood_ping_pong_parity_follows_pass_count() {
    let input = FrameInput::idle();

    // 16 px: 4 passes end back on the first buffer
    let even = renderer(16);
    assert_eq!(even.pipeline().jfa_pass_count(), 4);
    assert_eq!(final_flood(&even, &input), TargetId::FloodA);

    // 32 px: 5 passes end on the second
    let odd = renderer(32);
    assert_eq!(odd.pipeline().jfa_pass_count(), 5);
    assert_eq!(final_flood(&odd, &input), TargetId::FloodB);
}

fn single_pixel_brush(size: u32) -> SoftRenderer {
    // A radius 0.5 dab centred on a pixel covers only that pixel
    SoftRenderer::new(PipelineConfig::default().with_size(size, size).with_brush_radius(0.5))
        .expect("valid config")
}

fn flood_is_stable_under_an_extra_pass(renderer: &SoftRenderer) -> (PixelBuffer, PixelBuffer) {
    let size = renderer.pipeline().config().width;
    let flood = final_flood(renderer, &FrameInput::idle());
    let other = if flood == TargetId::FloodA {
        TargetId::FloodB
    } else {
        TargetId::FloodA
    };

    let mut executor = renderer.executor().clone();
    let slot = BindingTable::new()
        .slot(ProgramId::JumpFlood, "previous")
        .unwrap();
    executor
        .run_pass(&PassInvocation {
            label: "jump_flood",
            program: ProgramId::JumpFlood,
            target: DrawTarget::Offscreen(other),
            inputs: vec![TextureInput::new(slot, flood)],
            params: ParamBlock::new()
                .with("resolution", Vec2::splat(size as f32))
                .with("offset", 1),
            load: TargetLoad::TRANSPARENT,
        })
        .unwrap();
    (
        executor.target(flood).unwrap().clone(),
        executor.target(other).unwrap().clone(),
    )
}

#[test]
fn one_seed_floods_the_whole_canvas() {
    let size = 32;
    let mut renderer = single_pixel_brush(size);
    renderer
        .render(&FrameInput::click_at(pixel_centre(5, 9, size), ClickState::Primary))
        .unwrap();

    let seed = renderer.target(TargetId::Seed).unwrap();
    let seeded = seed.pixels().iter().filter(|p| p.w > 0.0).count();
    assert_eq!(seeded, 1);

    let (flood, extra) = flood_is_stable_under_an_extra_pass(&renderer);
    let expected = Vec4::new(5.5 / 32.0, 9.5 / 32.0, 0.0, 1.0);
    assert!(flood.pixels().iter().all(|p| *p == expected));
    assert_eq!(flood, extra);
}

#[test]
fn two_seeds_split_the_canvas_and_stay_put() {
    let size = 32;
    let mut renderer = single_pixel_brush(size);
    renderer
        .render(&FrameInput::click_at(pixel_centre(4, 16, size), ClickState::Primary))
        .unwrap();
    renderer
        .render(&FrameInput::click_at(pixel_centre(27, 16, size), ClickState::Primary))
        .unwrap();

    let (flood, extra) = flood_is_stable_under_an_extra_pass(&renderer);
    let left = Vec4::new(4.5 / 32.0, 16.5 / 32.0, 0.0, 1.0);
    let right = Vec4::new(27.5 / 32.0, 16.5 / 32.0, 0.0, 1.0);
    for y in 0..size {
        for x in 0..size {
            let expected = if x < 16 { left } else { right };
            assert_eq!(flood.get(x, y), expected, "pixel ({x}, {y})");
        }
    }
    assert_eq!(flood, extra);

    let distance = renderer.target(TargetId::DistanceField).unwrap();
    assert_eq!(distance.get(4, 16).x, 0.0);
    assert!(distance.get(16, 16).x > 0.0);
}

#[test]
fn light_reaches_past_the_finest_interval_and_walls_shadow_it() {
    let size = 64;
    let mut renderer = renderer(size);
    renderer
        .render(&FrameInput::click_at(pixel_centre(10, 32, size), ClickState::Primary))
        .unwrap();
    renderer
        .render(&FrameInput::stroke(
            pixel_centre(30, 0, size),
            pixel_centre(30, size - 1, size),
            ClickState::Secondary,
        ))
        .unwrap();
    renderer.render(&FrameInput::idle()).unwrap();

    let ambient = renderer.pipeline().config().ambient;
    let screen = renderer.screen();
    // Ten pixels out, the light is only found by a coarser level
    let lit = screen.get(20, 32).x;
    let shadowed = screen.get(40, 32).x;
    assert!(lit > 3.0 * ambient.x, "lit side {lit}");
    assert!(shadowed < ambient.x, "shadowed side {shadowed}");
    assert!(shadowed < lit);
}

fn with_feedback(size: u32) -> SoftRenderer {
    let config = PipelineConfig::default()
        .with_size(size, size)
        .with_brush_radius(3.0)
        .with_temporal_feedback(0.5);
    SoftRenderer::new(config).expect("valid config")
}

#[test]
fn temporal_feedback_keeps_the_previous_frame() {
    let size = 32;
    let mut renderer = with_feedback(size);
    renderer
        .render(&FrameInput::click_at(pixel_centre(8, 8, size), ClickState::Primary))
        .unwrap();
    renderer.render(&FrameInput::idle()).unwrap();

    let last = renderer.target(TargetId::LastFrame).unwrap();
    assert_eq!(last.pixels(), renderer.screen().pixels());
    assert!(last.get(8, 8).x > 0.5);
}

#[test]
fn brush_outline_is_not_fed_back() {
    let size = 32;
    let mut renderer = with_feedback(size);
    let hovering = FrameInput {
        cursor: Vec2::ZERO,
        last_cursor: Vec2::ZERO,
        click: ClickState::None,
    };
    renderer.render(&hovering).unwrap();

    // (19, 16) sits on the outline around pixel (16, 16)
    assert!(renderer.screen().get(19, 16).x > 0.3);
    let last = renderer.target(TargetId::LastFrame).unwrap();
    assert!(last.pixels().iter().all(|p| p.x < 0.05));

    renderer.render(&FrameInput::idle()).unwrap();
    let screen = renderer.screen();
    let corner = screen.get(0, 0);
    for pixel in screen.pixels() {
        assert_close(*pixel, corner, EIGHT_BIT);
    }
}
