//! CPU versions of the fragment programs.
//!
//! Each program reads its uniforms once per pass into a typed struct and is
//! then evaluated per pixel at the pixel centre, in the same row-0-at-top
//! pixel space the WGSL programs see through `@builtin(position)`.

use std::f32::consts::TAU;

use glam::{IVec2, Vec2, Vec3, Vec4, Vec4Swizzles};
use penumbra_core::{Error, ParamBlock, PassInvocation, ProgramId, Result};

use crate::buffer::PixelBuffer;

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn ipow(base: i32, exponent: i32) -> i32 {
    (0..exponent).fold(1, |acc, _| acc * base)
}

fn ndc_to_pixel(ndc: Vec2, resolution: Vec2) -> Vec2 {
    penumbra_core::ndc_to_pixel(ndc, resolution)
}

fn texel_of(frag: Vec2) -> IVec2 {
    frag.floor().as_ivec2()
}

/// Uniform values as the GPU would see them: absent fields read as zero
struct Uniforms<'a>(&'a ParamBlock);

impl Uniforms<'_> {
    fn int(&self, name: &str) -> i32 {
        self.0.int(name).unwrap_or(0)
    }

    fn float(&self, name: &str) -> f32 {
        self.0.float(name).unwrap_or(0.0)
    }

    fn vec2(&self, name: &str) -> Vec2 {
        self.0.vec2(name).unwrap_or(Vec2::ZERO)
    }

    fn vec4(&self, name: &str) -> Vec4 {
        self.0.vec4(name).unwrap_or(Vec4::ZERO)
    }
}

/// Textures bound to a pass, indexed by input slot
pub struct BoundInputs<'a> {
    program: ProgramId,
    textures: Vec<Option<&'a PixelBuffer>>,
}

impl<'a> BoundInputs<'a> {
    pub fn new(program: ProgramId, textures: Vec<Option<&'a PixelBuffer>>) -> Self {
        Self { program, textures }
    }

    fn get(&self, index: usize) -> Result<&'a PixelBuffer> {
        let desc = self.program.desc();
        self.textures.get(index).copied().flatten().ok_or_else(|| {
            Error::Binding {
                program: desc.name,
                input: desc.inputs.get(index).map_or("?", |input| input.name),
            }
        })
    }
}

pub struct Paint {
    from: Vec2,
    to: Vec2,
    painting: bool,
    radius: f32,
    color: Vec4,
}

impl Paint {
    fn shade(&self, frag: Vec2) -> Vec4 {
        if !self.painting {
            return Vec4::ZERO;
        }
        let ab = self.to - self.from;
        let len_sq = ab.dot(ab);
        let t = if len_sq > 0.0 {
            ((frag - self.from).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let d = (frag - (self.from + ab * t)).length();
        let coverage = 1.0 - smoothstep(self.radius - 1.0, self.radius, d);
        self.color.xyz().extend(self.color.w * coverage)
    }
}

pub struct Seed<'a> {
    canvas: &'a PixelBuffer,
    resolution: Vec2,
    threshold: f32,
}

impl Seed<'_> {
    fn shade(&self, frag: Vec2) -> Vec4 {
        if self.canvas.load(texel_of(frag)).w > self.threshold {
            Vec4::new(frag.x / self.resolution.x, frag.y / self.resolution.y, 0.0, 1.0)
        } else {
            Vec4::ZERO
        }
    }
}

pub struct JumpFlood<'a> {
    previous: &'a PixelBuffer,
    resolution: Vec2,
    offset: i32,
}

impl JumpFlood<'_> {
    fn shade(&self, frag: Vec2) -> Vec4 {
        let size = self.resolution.as_ivec2();
        let texel = texel_of(frag);

        let mut best = Vec4::ZERO;
        let mut best_dist = f32::MAX;

        let center = self.previous.load(texel);
        if center.w > 0.0 {
            best = center;
            best_dist = (center.xy() * self.resolution).distance(frag);
        }

        for y in -1..=1 {
            for x in -1..=1 {
                if x == 0 && y == 0 {
                    continue;
                }
                let neighbour = texel + IVec2::new(x, y) * self.offset;
                if neighbour.cmplt(IVec2::ZERO).any() || neighbour.cmpge(size).any() {
                    continue;
                }
                let candidate = self.previous.load(neighbour);
                if candidate.w > 0.0 {
                    let d = (candidate.xy() * self.resolution).distance(frag);
                    if d < best_dist {
                        best = candidate;
                        best_dist = d;
                    }
                }
            }
        }
        best
    }
}

pub struct DistanceField<'a> {
    flood: &'a PixelBuffer,
    resolution: Vec2,
}

impl DistanceField<'_> {
    fn shade(&self, frag: Vec2) -> Vec4 {
        let seed = self.flood.load(texel_of(frag));
        if seed.w <= 0.0 {
            return Vec4::ONE;
        }
        let diagonal = self.resolution.length();
        let d = ((seed.xy() * self.resolution).distance(frag) / diagonal).min(1.0);
        Vec4::new(d, d, d, 1.0)
    }
}

pub struct Cascade<'a> {
    canvas: &'a PixelBuffer,
    distance: &'a PixelBuffer,
    last_cascade: &'a PixelBuffer,
    last_frame: &'a PixelBuffer,
    resolution: Vec2,
    ambient: Vec3,
    base: i32,
    level: i32,
    count: i32,
    temporal_weight: f32,
    max_steps: i32,
}

impl Cascade<'_> {
    fn march(&self, origin: Vec2, dir: Vec2, start: f32, end: f32) -> Vec4 {
        let diagonal = self.resolution.length();
        let mut t = start;
        for _ in 0..self.max_steps {
            if t >= end {
                break;
            }
            let p = origin + dir * t;
            if p.cmplt(Vec2::ZERO).any() || p.cmpge(self.resolution).any() {
                break;
            }
            let texel = p.floor().as_ivec2();
            let d = self.distance.load(texel).x * diagonal;
            if d < 0.5 {
                return self.canvas.load(texel).xyz().extend(1.0);
            }
            t += d.max(1.0);
        }
        Vec4::ZERO
    }

    fn sky(&self, origin: Vec2) -> Vec3 {
        let mut color = self.ambient;
        if self.temporal_weight > 0.0 {
            let previous = self.last_frame.load(origin.floor().as_ivec2()).xyz();
            color = color.lerp(previous, self.temporal_weight);
        }
        color
    }

    fn shade(&self, frag: Vec2) -> Vec4 {
        let level = self.level;
        let base = self.base;
        let sqrt_base = (base as f32).sqrt().round() as i32;
        let extent = self.resolution.as_ivec2();

        let spacing = ipow(sqrt_base, level);
        let size = extent / spacing;
        if size.cmplt(IVec2::ONE).any() {
            return Vec4::ZERO;
        }

        let coord = texel_of(frag);
        let cell = coord / size;
        if cell.cmpge(IVec2::splat(spacing)).any() {
            return Vec4::ZERO;
        }
        let probe = coord - cell * size;
        let ray_group = cell.x + cell.y * spacing;
        let ray_count = (base * spacing * spacing) as f32;
        let origin = (probe.as_vec2() + 0.5) * spacing as f32;

        let start = if level > 0 {
            ipow(base, level - 1) as f32
        } else {
            0.0
        };
        let end = ipow(base, level) as f32;

        let upper_spacing = spacing * sqrt_base;
        let upper_size = extent / upper_spacing;
        let has_upper = level < self.count && upper_size.cmpge(IVec2::ONE).all();
        let upper_offset = ((probe.as_vec2() + 0.5) / sqrt_base as f32)
            .max(Vec2::splat(0.5))
            .min(upper_size.as_vec2() - 0.5);

        let mut total = Vec3::ZERO;
        for k in 0..base {
            let index = ray_group * base + k;
            let angle = TAU * (index as f32 + 0.5) / ray_count;
            let dir = Vec2::new(angle.cos(), angle.sin());

            let mut radiance = self.march(origin, dir, start, end);
            if radiance.w == 0.0 {
                radiance = if has_upper {
                    let upper_block = IVec2::new(index % upper_spacing, index / upper_spacing);
                    let uv = ((upper_block * upper_size).as_vec2() + upper_offset) / self.resolution;
                    self.last_cascade.sample(uv)
                } else {
                    self.sky(origin).extend(1.0)
                };
            }
            total += radiance.xyz();
        }

        (total / base as f32).extend(1.0)
    }
}

pub struct Cursor {
    mouse: Vec2,
    brush_radius: f32,
}

impl Cursor {
    fn shade(&self, frag: Vec2) -> Vec4 {
        let ring =
            1.0 - smoothstep(0.0, 1.5, (frag.distance(self.mouse) - self.brush_radius).abs());
        Vec4::new(1.0, 1.0, 1.0, ring * 0.5)
    }
}

/// A program with its uniforms decoded and its inputs bound
pub enum Shader<'a> {
    Paint(Paint),
    Seed(Seed<'a>),
    JumpFlood(JumpFlood<'a>),
    DistanceField(DistanceField<'a>),
    Cascade(Cascade<'a>),
    Cursor(Cursor),
}

impl<'a> Shader<'a> {
    pub fn prepare(pass: &PassInvocation, inputs: &BoundInputs<'a>) -> Result<Self> {
        let u = Uniforms(&pass.params);
        let resolution = u.vec2("resolution");
        Ok(match pass.program {
            ProgramId::Paint => Shader::Paint(Paint {
                from: ndc_to_pixel(u.vec2("last_mouse"), resolution),
                to: ndc_to_pixel(u.vec2("mouse"), resolution),
                painting: u.int("click") != 0,
                radius: u.float("brush_radius"),
                color: u.vec4("brush_color"),
            }),
            ProgramId::Seed => Shader::Seed(Seed {
                canvas: inputs.get(0)?,
                resolution,
                threshold: u.float("threshold"),
            }),
            ProgramId::JumpFlood => Shader::JumpFlood(JumpFlood {
                previous: inputs.get(0)?,
                resolution,
                offset: u.int("offset"),
            }),
            ProgramId::DistanceField => Shader::DistanceField(DistanceField {
                flood: inputs.get(0)?,
                resolution,
            }),
            ProgramId::Cascade => Shader::Cascade(Cascade {
                canvas: inputs.get(0)?,
                distance: inputs.get(1)?,
                last_cascade: inputs.get(2)?,
                last_frame: inputs.get(3)?,
                resolution,
                ambient: u.vec4("ambient").xyz(),
                base: u.int("base_ray_count"),
                level: u.int("cascade_index"),
                count: u.int("cascade_count"),
                temporal_weight: u.float("temporal_weight"),
                max_steps: u.int("max_steps"),
            }),
            ProgramId::Cursor => Shader::Cursor(Cursor {
                mouse: ndc_to_pixel(u.vec2("mouse"), resolution),
                brush_radius: u.float("brush_radius"),
            }),
        })
    }

    /// Evaluate at a pixel centre
    pub fn shade(&self, frag: Vec2) -> Vec4 {
        match self {
            Shader::Paint(p) => p.shade(frag),
            Shader::Seed(p) => p.shade(frag),
            Shader::JumpFlood(p) => p.shade(frag),
            Shader::DistanceField(p) => p.shade(frag),
            Shader::Cascade(p) => p.shade(frag),
            Shader::Cursor(p) => p.shade(frag),
        }
    }
}
