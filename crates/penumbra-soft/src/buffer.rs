//! Software render targets

use glam::{IVec2, Vec2, Vec4};
use half::f16;
use penumbra_core::{FilterMode, PixelFormat, RenderTargetDesc};

/// An RGBA image that stores values with the precision of its format
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    filter: FilterMode,
    data: Vec<Vec4>,
}

fn quantize_unorm8(v: f32) -> f32 {
    (v.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, format: PixelFormat, filter: FilterMode) -> Self {
        Self {
            width,
            height,
            format,
            filter,
            data: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    pub fn from_desc(desc: &RenderTargetDesc) -> Self {
        Self::new(desc.width, desc.height, desc.format, desc.filter)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Round a value the way the format would store it
    pub fn quantize(&self, v: Vec4) -> Vec4 {
        match self.format {
            PixelFormat::Rgba8Unorm | PixelFormat::Presentation => Vec4::new(
                quantize_unorm8(v.x),
                quantize_unorm8(v.y),
                quantize_unorm8(v.z),
                quantize_unorm8(v.w),
            ),
            PixelFormat::Rgba16Float => Vec4::from_array(
                v.to_array()
                    .map(|c| f16::from_f32(c).to_f32()),
            ),
            PixelFormat::Rgba32Float => v,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, v: Vec4) {
        let stored = self.quantize(v);
        let index = self.index(x, y);
        self.data[index] = stored;
    }

    pub fn fill(&mut self, v: Vec4) {
        let stored = self.quantize(v);
        self.data.fill(stored);
    }

    /// Exact texel fetch; coordinates are clamped to the edge
    pub fn load(&self, texel: IVec2) -> Vec4 {
        let x = texel.x.clamp(0, self.width as i32 - 1) as u32;
        let y = texel.y.clamp(0, self.height as i32 - 1) as u32;
        self.get(x, y)
    }

    /// Sample at normalized `uv` using this target's filter, clamp to edge
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let size = Vec2::new(self.width as f32, self.height as f32);
        match self.filter {
            FilterMode::Nearest => self.load((uv * size).floor().as_ivec2()),
            FilterMode::Linear => {
                let p = uv * size - 0.5;
                let base = p.floor();
                let f = p - base;
                let t = base.as_ivec2();
                let a = self.load(t);
                let b = self.load(t + IVec2::new(1, 0));
                let c = self.load(t + IVec2::new(0, 1));
                let d = self.load(t + IVec2::new(1, 1));
                a.lerp(b, f.x).lerp(c.lerp(d, f.x), f.y)
            }
        }
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.data
    }

    /// Copy `other` into this buffer, re-quantizing to this format
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        let width = self.width.min(other.width);
        let height = self.height.min(other.height);
        for y in 0..height {
            for x in 0..width {
                self.set(x, y, other.get(x, y));
            }
        }
    }

    /// 8-bit RGBA bytes, row 0 first
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|v| v.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}
