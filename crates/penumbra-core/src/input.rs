//! Per-frame input snapshot
//!
//! Window events are folded into an [`InputState`] as they arrive; once per
//! frame the loop takes an immutable [`FrameInput`] from it and hands that to
//! [`Pipeline::run_frame`](crate::Pipeline::run_frame). Nothing else carries
//! input between stages.

use glam::Vec2;

/// Which brush is active this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClickState {
    #[default]
    None,
    /// Primary button: paints light
    Primary,
    /// Secondary button: paints occluding wall
    Secondary,
}

impl ClickState {
    /// Integer encoding shared with the shading programs
    pub fn as_i32(self) -> i32 {
        match self {
            ClickState::None => 0,
            ClickState::Primary => 1,
            ClickState::Secondary => 2,
        }
    }

    pub fn is_painting(self) -> bool {
        self != ClickState::None
    }
}

/// Mouse buttons the demo reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Other,
}

impl MouseButton {
    fn click_state(self) -> Option<ClickState> {
        match self {
            MouseButton::Primary => Some(ClickState::Primary),
            MouseButton::Secondary => Some(ClickState::Secondary),
            MouseButton::Other => None,
        }
    }
}

/// Immutable input for one frame. Cursor positions are in NDC, `[-1, 1]`
/// with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub cursor: Vec2,
    pub last_cursor: Vec2,
    pub click: ClickState,
}

impl FrameInput {
    /// Cursor position used before the pointer has entered the window.
    /// Far enough outside the canvas that no brush ring is drawn.
    pub const OFFSCREEN_CURSOR: Vec2 = Vec2::new(-4.0, -4.0);

    /// No button held, cursor outside the canvas
    pub fn idle() -> Self {
        Self {
            cursor: Self::OFFSCREEN_CURSOR,
            last_cursor: Self::OFFSCREEN_CURSOR,
            click: ClickState::None,
        }
    }

    /// A stationary click at `cursor`
    pub fn click_at(cursor: Vec2, click: ClickState) -> Self {
        Self {
            cursor,
            last_cursor: cursor,
            click,
        }
    }

    /// A drag from `from` to `to` with `click` held
    pub fn stroke(from: Vec2, to: Vec2, click: ClickState) -> Self {
        Self {
            cursor: to,
            last_cursor: from,
            click,
        }
    }
}

impl Default for FrameInput {
    fn default() -> Self {
        Self::idle()
    }
}

/// Convert an NDC position to pixel coordinates, row 0 at the top
pub fn ndc_to_pixel(ndc: Vec2, resolution: Vec2) -> Vec2 {
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * resolution.x,
        (0.5 - ndc.y * 0.5) * resolution.y,
    )
}

/// Accumulates window events between frames
#[derive(Debug, Clone)]
pub struct InputState {
    size: Vec2,
    cursor: Option<Vec2>,
    last_cursor: Option<Vec2>,
    click: ClickState,
}

impl InputState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            cursor: None,
            last_cursor: None,
            click: ClickState::None,
        }
    }

    /// Map later cursor positions against a window of this size.
    ///
    /// The canvas keeps its own resolution; a window of a different size
    /// shows it stretched, so NDC follows the window.
    pub fn on_resized(&mut self, width: u32, height: u32) {
        self.size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Record a cursor position in raw window pixels
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let ndc = Vec2::new(
            (x as f32 / self.size.x) * 2.0 - 1.0,
            1.0 - (y as f32 / self.size.y) * 2.0,
        );
        // The first stroke starts where the pointer first appeared
        if self.last_cursor.is_none() {
            self.last_cursor = Some(ndc);
        }
        self.cursor = Some(ndc);
    }

    /// Record a button transition. The most recent press wins; releasing
    /// the active button stops painting.
    pub fn on_button(&mut self, button: MouseButton, pressed: bool) {
        let Some(state) = button.click_state() else {
            return;
        };
        if pressed {
            self.click = state;
        } else if self.click == state {
            self.click = ClickState::None;
        }
    }

    pub fn click(&self) -> ClickState {
        self.click
    }

    /// Snapshot for the frame about to run
    pub fn snapshot(&self) -> FrameInput {
        let cursor = self.cursor.unwrap_or(FrameInput::OFFSCREEN_CURSOR);
        FrameInput {
            cursor,
            last_cursor: self.last_cursor.unwrap_or(cursor),
            click: self.click,
        }
    }

    /// Called after the frame has been submitted
    pub fn end_frame(&mut self) {
        if self.cursor.is_some() {
            self.last_cursor = self.cursor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_maps_to_ndc_with_y_flipped() {
        let mut input = InputState::new(800, 600);
        input.on_cursor_moved(0.0, 0.0);
        assert_eq!(input.snapshot().cursor, Vec2::new(-1.0, 1.0));

        input.on_cursor_moved(400.0, 300.0);
        assert_eq!(input.snapshot().cursor, Vec2::ZERO);

        input.on_cursor_moved(800.0, 600.0);
        assert_eq!(input.snapshot().cursor, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn cursor_follows_the_resized_window() {
        let mut input = InputState::new(800, 800);
        input.on_resized(1600, 400);
        input.on_cursor_moved(800.0, 200.0);
        assert_eq!(input.snapshot().cursor, Vec2::ZERO);

        input.on_cursor_moved(1600.0, 0.0);
        assert_eq!(input.snapshot().cursor, Vec2::new(1.0, 1.0));

        // A zero-sized (minimised) window does not divide by zero
        input.on_resized(0, 0);
        input.on_cursor_moved(0.0, 0.0);
        assert!(!input.snapshot().cursor.is_nan());
    }

    #[test]
    fn first_position_seeds_previous_cursor() {
        let mut input = InputState::new(100, 100);
        input.on_cursor_moved(75.0, 25.0);
        let frame = input.snapshot();
        assert_eq!(frame.cursor, frame.last_cursor);
    }

    #[test]
    fn previous_cursor_advances_at_end_of_frame() {
        let mut input = InputState::new(100, 100);
        input.on_cursor_moved(50.0, 50.0);
        input.end_frame();
        input.on_cursor_moved(100.0, 50.0);

        let frame = input.snapshot();
        assert_eq!(frame.last_cursor, Vec2::ZERO);
        assert_eq!(frame.cursor, Vec2::new(1.0, 0.0));

        input.end_frame();
        assert_eq!(input.snapshot().last_cursor, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn last_button_event_wins() {
        let mut input = InputState::new(10, 10);
        input.on_button(MouseButton::Primary, true);
        assert_eq!(input.click(), ClickState::Primary);

        input.on_button(MouseButton::Secondary, true);
        assert_eq!(input.click(), ClickState::Secondary);

        // Releasing the older button leaves the newer one active
        input.on_button(MouseButton::Primary, false);
        assert_eq!(input.click(), ClickState::Secondary);

        input.on_button(MouseButton::Secondary, false);
        assert_eq!(input.click(), ClickState::None);

        input.on_button(MouseButton::Other, true);
        assert_eq!(input.click(), ClickState::None);
    }

    #[test]
    fn click_codes() {
        assert_eq!(ClickState::None.as_i32(), 0);
        assert_eq!(ClickState::Primary.as_i32(), 1);
        assert_eq!(ClickState::Secondary.as_i32(), 2);
    }

    #[test]
    fn ndc_to_pixel_puts_row_zero_at_top() {
        let res = Vec2::new(200.0, 100.0);
        assert_eq!(ndc_to_pixel(Vec2::new(-1.0, 1.0), res), Vec2::ZERO);
        assert_eq!(ndc_to_pixel(Vec2::ZERO, res), Vec2::new(100.0, 50.0));
    }
}
