//! Program catalogue and binding table
//!
//! Every shading program is described once here: the textures it samples,
//! the uniforms it takes, and how its output is blended. Backends compile
//! from these descriptions; stages resolve their input slots through the
//! [`BindingTable`] so no call site ever deals in raw binding numbers.

use std::collections::HashMap;

use log::debug;

use crate::params::{ParamField, ParamKind, ParamLayout};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramId {
    Paint,
    Seed,
    JumpFlood,
    DistanceField,
    Cascade,
    Cursor,
}

impl ProgramId {
    pub const ALL: [ProgramId; 6] = [
        ProgramId::Paint,
        ProgramId::Seed,
        ProgramId::JumpFlood,
        ProgramId::DistanceField,
        ProgramId::Cascade,
        ProgramId::Cursor,
    ];

    pub fn name(self) -> &'static str {
        self.desc().name
    }

    pub fn desc(self) -> &'static ProgramDesc {
        match self {
            ProgramId::Paint => &PAINT,
            ProgramId::Seed => &SEED,
            ProgramId::JumpFlood => &JUMP_FLOOD,
            ProgramId::DistanceField => &DISTANCE_FIELD,
            ProgramId::Cascade => &CASCADE,
            ProgramId::Cursor => &CURSOR,
        }
    }
}

/// How a program reads one of its input textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampling {
    /// Exact texel fetch by integer coordinate
    Load,
    /// Filtered sample through the target's sampler
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDecl {
    pub name: &'static str,
    pub sampling: Sampling,
}

impl InputDecl {
    const fn load(name: &'static str) -> Self {
        Self {
            name,
            sampling: Sampling::Load,
        }
    }

    const fn filtered(name: &'static str) -> Self {
        Self {
            name,
            sampling: Sampling::Filtered,
        }
    }
}

/// Output blending of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Replace,
    /// Source-over alpha compositing
    AlphaOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramDesc {
    pub id: ProgramId,
    pub name: &'static str,
    /// WGSL fragment module file stem
    pub fragment: &'static str,
    pub inputs: &'static [InputDecl],
    pub params: ParamLayout,
    pub blend: BlendMode,
}

impl ProgramDesc {
    pub fn input(&self, slot: InputSlot) -> Option<&InputDecl> {
        self.inputs.get(slot.index())
    }
}

use ParamKind::{Float, Int, Vec2, Vec4};

static PAINT: ProgramDesc = ProgramDesc {
    id: ProgramId::Paint,
    name: "paint",
    fragment: "paint",
    inputs: &[],
    params: ParamLayout::new(&[
        ParamField::new("resolution", Vec2),
        ParamField::new("mouse", Vec2),
        ParamField::new("last_mouse", Vec2),
        ParamField::new("click", Int),
        ParamField::new("brush_radius", Float),
        ParamField::new("brush_color", Vec4),
    ]),
    blend: BlendMode::AlphaOver,
};

static SEED: ProgramDesc = ProgramDesc {
    id: ProgramId::Seed,
    name: "seed",
    fragment: "seed",
    inputs: &[InputDecl::load("canvas")],
    params: ParamLayout::new(&[
        ParamField::new("resolution", Vec2),
        ParamField::new("threshold", Float),
    ]),
    blend: BlendMode::Replace,
};

static JUMP_FLOOD: ProgramDesc = ProgramDesc {
    id: ProgramId::JumpFlood,
    name: "jump_flood",
    fragment: "jump_flood",
    inputs: &[InputDecl::load("previous")],
    params: ParamLayout::new(&[
        ParamField::new("resolution", Vec2),
        ParamField::new("offset", Int),
    ]),
    blend: BlendMode::Replace,
};

static DISTANCE_FIELD: ProgramDesc = ProgramDesc {
    id: ProgramId::DistanceField,
    name: "distance_field",
    fragment: "distance",
    inputs: &[InputDecl::load("flood")],
    params: ParamLayout::new(&[ParamField::new("resolution", Vec2)]),
    blend: BlendMode::Replace,
};

static CASCADE: ProgramDesc = ProgramDesc {
    id: ProgramId::Cascade,
    name: "cascade",
    fragment: "cascade",
    inputs: &[
        InputDecl::load("canvas"),
        InputDecl::load("distance"),
        InputDecl::filtered("last_cascade"),
        InputDecl::load("last_frame"),
    ],
    params: ParamLayout::new(&[
        ParamField::new("resolution", Vec2),
        ParamField::new("ambient", Vec4),
        ParamField::new("base_ray_count", Int),
        ParamField::new("cascade_index", Int),
        ParamField::new("cascade_count", Int),
        ParamField::new("temporal_weight", Float),
        ParamField::new("max_steps", Int),
    ]),
    blend: BlendMode::Replace,
};

/// Brush outline drawn over the finished frame
static CURSOR: ProgramDesc = ProgramDesc {
    id: ProgramId::Cursor,
    name: "cursor",
    fragment: "cursor",
    inputs: &[],
    params: ParamLayout::new(&[
        ParamField::new("resolution", Vec2),
        ParamField::new("mouse", Vec2),
        ParamField::new("brush_radius", Float),
    ]),
    blend: BlendMode::AlphaOver,
};

/// Index of an input texture within its program's declaration list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputSlot(u32);

impl InputSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Name → slot lookup for every program, built once at setup
#[derive(Debug, Clone)]
pub struct BindingTable {
    slots: HashMap<(ProgramId, &'static str), InputSlot>,
}

impl BindingTable {
    pub fn new() -> Self {
        let mut slots = HashMap::new();
        for program in ProgramId::ALL {
            for (index, input) in program.desc().inputs.iter().enumerate() {
                slots.insert((program, input.name), InputSlot(index as u32));
            }
            debug!(
                "Program {}: {} inputs, {} byte uniform block",
                program.name(),
                program.desc().inputs.len(),
                program.desc().params.size()
            );
        }
        Self { slots }
    }

    /// Resolve a named input of `program`
    pub fn slot(&self, program: ProgramId, input: &'static str) -> Result<InputSlot> {
        self.slots
            .get(&(program, input))
            .copied()
            .ok_or(Error::Binding {
                program: program.name(),
                input,
            })
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_uniform_block_layout() {
        let params = ProgramId::Cascade.desc().params;
        assert_eq!(params.offset_of("resolution"), Some(0));
        assert_eq!(params.offset_of("ambient"), Some(16));
        assert_eq!(params.offset_of("base_ray_count"), Some(32));
        assert_eq!(params.offset_of("temporal_weight"), Some(44));
        assert_eq!(params.offset_of("max_steps"), Some(48));
        assert_eq!(params.offset_of("mouse"), None);
        assert_eq!(params.size(), 64);
    }

    #[test]
    fn cursor_uniform_block_layout() {
        let params = ProgramId::Cursor.desc().params;
        assert_eq!(params.offset_of("mouse"), Some(8));
        assert_eq!(params.offset_of("brush_radius"), Some(16));
        assert_eq!(params.size(), 32);
        assert!(ProgramId::Cursor.desc().inputs.is_empty());
    }

    #[test]
    fn paint_uniform_block_layout() {
        let params = ProgramId::Paint.desc().params;
        assert_eq!(params.offset_of("click"), Some(24));
        assert_eq!(params.offset_of("brush_color"), Some(32));
        assert_eq!(params.size(), 48);
        assert_eq!(ProgramId::Seed.desc().params.size(), 16);
    }

    #[test]
    fn slots_follow_declaration_order() {
        let table = BindingTable::new();
        let slot = |name| table.slot(ProgramId::Cascade, name).unwrap().index();
        assert_eq!(slot("canvas"), 0);
        assert_eq!(slot("distance"), 1);
        assert_eq!(slot("last_cascade"), 2);
        assert_eq!(slot("last_frame"), 3);
    }

    #[test]
    fn unknown_input_is_a_binding_error() {
        let table = BindingTable::new();
        let err = table.slot(ProgramId::Seed, "distance").unwrap_err();
        assert!(matches!(
            err,
            Error::Binding {
                program: "seed",
                input: "distance"
            }
        ));
    }

    #[test]
    fn only_overlays_blend() {
        for program in ProgramId::ALL {
            let expected = if matches!(program, ProgramId::Paint | ProgramId::Cursor) {
                BlendMode::AlphaOver
            } else {
                BlendMode::Replace
            };
            assert_eq!(program.desc().blend, expected);
        }
    }
}
