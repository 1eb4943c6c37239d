use glam::{Vec3, Vec4};

use crate::{Error, Result};

/// Startup configuration for the lighting pipeline.
///
/// All values are fixed for the lifetime of a run; the canvas is never
/// resized.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Window title used by the windowed demo
    pub title: String,
    /// Rays cast per probe at every cascade level. Must be a perfect square.
    pub base_ray_count: u32,
    /// Brush radius in pixels
    pub brush_radius: f32,
    /// Colour painted with the primary button (emissive)
    pub light_color: Vec3,
    /// Colour painted with the secondary button (occluder)
    pub wall_color: Vec3,
    /// Radiance gathered by rays that escape the coarsest cascade
    pub ambient: Vec3,
    /// Canvas alpha above which a pixel seeds the flood fill
    pub seed_threshold: f32,
    /// Sphere-tracing step budget per ray
    pub max_march_steps: u32,
    /// Feed the previous frame back into the coarsest cascade
    pub temporal_feedback: bool,
    /// 0.0 = ambient only, 1.0 = previous frame only
    pub temporal_weight: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            title: "Radiance Cascades".to_string(),
            base_ray_count: 16,
            brush_radius: 6.0,
            light_color: Vec3::new(1.0, 0.85, 0.6),
            wall_color: Vec3::ZERO,
            ambient: Vec3::new(0.02, 0.02, 0.03),
            seed_threshold: 0.5,
            max_march_steps: 32,
            temporal_feedback: false,
            temporal_weight: 0.5,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the canvas size in pixels
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the per-level ray count (validated in [`PipelineConfig::validate`])
    pub fn with_base_ray_count(mut self, count: u32) -> Self {
        self.base_ray_count = count;
        self
    }

    pub fn with_brush_radius(mut self, radius: f32) -> Self {
        self.brush_radius = radius.max(0.5);
        self
    }

    pub fn with_light_color(mut self, color: Vec3) -> Self {
        self.light_color = color.max(Vec3::ZERO);
        self
    }

    pub fn with_wall_color(mut self, color: Vec3) -> Self {
        self.wall_color = color.max(Vec3::ZERO);
        self
    }

    pub fn with_ambient(mut self, ambient: Vec3) -> Self {
        self.ambient = ambient.max(Vec3::ZERO);
        self
    }

    pub fn with_max_march_steps(mut self, steps: u32) -> Self {
        self.max_march_steps = steps.max(1);
        self
    }

    /// Enable last-frame feedback with the given blend weight (0.0-1.0)
    pub fn with_temporal_feedback(mut self, weight: f32) -> Self {
        self.temporal_feedback = true;
        self.temporal_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Canvas size as a float vector, the form every program expects
    pub fn resolution(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn ambient_rgba(&self) -> Vec4 {
        self.ambient.extend(1.0)
    }

    /// Reject configurations the pipeline cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::setup(
                "canvas",
                format!("size must be non-zero, got {}x{}", self.width, self.height),
            ));
        }
        let root = (self.base_ray_count as f64).sqrt().round() as u32;
        if self.base_ray_count < 4 || root * root != self.base_ray_count {
            return Err(Error::setup(
                "radiance cascades",
                format!(
                    "base ray count must be a perfect square >= 4, got {}",
                    self.base_ray_count
                ),
            ));
        }
        Ok(())
    }
}
