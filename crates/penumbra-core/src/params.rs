//! Named program parameters and their uniform-block packing
//!
//! Stages describe parameters by name in a [`ParamBlock`]. Each program owns
//! a static [`ParamLayout`] that fixes the order and type of its uniforms;
//! [`ParamLayout::pack`] turns a block into the bytes a GPU uniform buffer
//! expects, following WGSL alignment rules.

use glam::{Vec2, Vec4};
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Int,
    Float,
    Vec2,
    Vec4,
}

impl ParamKind {
    /// (size, alignment) in bytes inside a uniform block
    pub const fn size_align(self) -> (u64, u64) {
        match self {
            ParamKind::Int | ParamKind::Float => (4, 4),
            ParamKind::Vec2 => (8, 8),
            ParamKind::Vec4 => (16, 16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec4(Vec4),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Vec2(_) => ParamKind::Vec2,
            ParamValue::Vec4(_) => ParamKind::Vec4,
        }
    }

    fn write_le(&self, out: &mut [u8]) {
        match self {
            ParamValue::Int(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            ParamValue::Float(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            ParamValue::Vec2(v) => out[..8].copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            ParamValue::Vec4(v) => out[..16].copy_from_slice(bytemuck::bytes_of(&v.to_array())),
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Vec2> for ParamValue {
    fn from(v: Vec2) -> Self {
        ParamValue::Vec2(v)
    }
}

impl From<Vec4> for ParamValue {
    fn from(v: Vec4) -> Self {
        ParamValue::Vec4(v)
    }
}

/// Parameter values for one draw, keyed by uniform name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBlock {
    values: Vec<(&'static str, ParamValue)>,
}

impl ParamBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any earlier value with the same name
    pub fn set(&mut self, name: &'static str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name)? {
            ParamValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            ParamValue::Vec4(v) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One named field of a uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamField {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamField {
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered uniform block description for one program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    fields: &'static [ParamField],
}

impl ParamLayout {
    pub const fn new(fields: &'static [ParamField]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [ParamField] {
        self.fields
    }

    /// Byte offset of every field, in declaration order
    pub fn offsets(&self) -> Vec<u64> {
        let mut offset = 0;
        self.fields
            .iter()
            .map(|field| {
                let (size, align) = field.kind.size_align();
                offset = align_to(offset, align);
                let at = offset;
                offset += size;
                at
            })
            .collect()
    }

    pub fn offset_of(&self, name: &str) -> Option<u64> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        self.offsets().get(index).copied()
    }

    /// Block size rounded up to 16 bytes
    pub fn size(&self) -> u64 {
        let end = self
            .fields
            .iter()
            .zip(self.offsets())
            .map(|(field, offset)| offset + field.kind.size_align().0)
            .max()
            .unwrap_or(0);
        align_to(end.max(16), 16)
    }

    /// Serialize `block` into uniform-buffer bytes.
    ///
    /// Missing or mistyped fields are zeroed; names the layout does not know
    /// are ignored. Both are logged since they point at a stage bug.
    pub fn pack(&self, program: &str, block: &ParamBlock) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size() as usize];
        for (field, offset) in self.fields.iter().zip(self.offsets()) {
            match block.get(field.name) {
                Some(value) if value.kind() == field.kind => {
                    value.write_le(&mut bytes[offset as usize..]);
                }
                Some(value) => warn!(
                    "{}: parameter '{}' is {:?}, expected {:?}",
                    program,
                    field.name,
                    value.kind(),
                    field.kind
                ),
                None => warn!("{}: parameter '{}' not set", program, field.name),
            }
        }
        for (name, _) in block.iter() {
            if !self.fields.iter().any(|f| f.name == name) {
                warn!("{}: no uniform named '{}'", program, name);
            }
        }
        bytes
    }
}

/// Round `value` up to a multiple of `alignment`
pub fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: ParamLayout = ParamLayout::new(&[
        ParamField::new("a", ParamKind::Float),
        ParamField::new("b", ParamKind::Vec2),
        ParamField::new("c", ParamKind::Vec4),
        ParamField::new("d", ParamKind::Int),
    ]);

    #[test]
    fn offsets_follow_wgsl_alignment() {
        assert_eq!(MIXED.offsets(), vec![0, 8, 16, 32]);
        assert_eq!(MIXED.size(), 48);
        assert_eq!(MIXED.offset_of("c"), Some(16));
        assert_eq!(MIXED.offset_of("missing"), None);
    }

    #[test]
    fn pack_writes_little_endian_values() {
        let block = ParamBlock::new()
            .with("a", 1.5f32)
            .with("b", Vec2::new(2.0, 3.0))
            .with("c", Vec4::new(4.0, 5.0, 6.0, 7.0))
            .with("d", -2i32);
        let bytes = MIXED.pack("test", &block);
        assert_eq!(bytes.len(), 48);

        let floats: Vec<f32> = bytes[..32]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(floats[0], 1.5);
        assert_eq!(&floats[2..4], &[2.0, 3.0]);
        assert_eq!(&floats[4..8], &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(i32::from_le_bytes(bytes[32..36].try_into().unwrap()), -2);
    }

    #[test]
    fn missing_and_mistyped_fields_are_zeroed() {
        let block = ParamBlock::new().with("a", 3i32);
        let bytes = MIXED.pack("test", &block);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut block = ParamBlock::new().with("offset", 8i32);
        block.set("offset", 4i32);
        assert_eq!(block.len(), 1);
        assert_eq!(block.int("offset"), Some(4));
        assert_eq!(block.float("offset"), None);
    }

    #[test]
    fn empty_layout_still_occupies_one_row() {
        assert_eq!(ParamLayout::new(&[]).size(), 16);
    }
}
