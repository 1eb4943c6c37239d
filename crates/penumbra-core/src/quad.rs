//! Full-screen quad shared by every pass

use bytemuck::{Pod, Zeroable};

/// Vertex layout: position at offset 0, a placeholder colour at offset 12
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl QuadVertex {
    pub const STRIDE: u64 = std::mem::size_of::<QuadVertex>() as u64;
    pub const POSITION_OFFSET: u64 = 0;
    pub const COLOR_OFFSET: u64 = 12;

    const fn new(x: f32, y: f32) -> Self {
        Self {
            position: [x, y, 0.0],
            color: [0.0, 0.0, 0.1, 1.0],
        }
    }
}

/// Corners covering NDC `[-1, 1]²`
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new(-1.0, -1.0),
    QuadVertex::new(-1.0, 1.0),
    QuadVertex::new(1.0, -1.0),
    QuadVertex::new(1.0, 1.0),
];

pub const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 3, 2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout() {
        assert_eq!(QuadVertex::STRIDE, 28);
        assert_eq!(bytemuck::cast_slice::<QuadVertex, u8>(&QUAD_VERTICES).len(), 4 * 28);
    }

    #[test]
    fn quad_covers_ndc() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }
}
