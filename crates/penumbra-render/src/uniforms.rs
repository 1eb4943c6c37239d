//! Per-frame uniform arena
//!
//! Every pass in a frame gets its own slot in a single uniform buffer and
//! binds it with a dynamic offset. Passes that reuse a program (the flood
//! iterations, the cascade levels) therefore keep distinct parameters even
//! though they are all recorded before the one submit.

use log::debug;
use penumbra_core::params::align_to;
use penumbra_core::{Error, ProgramId, Result};

pub struct UniformArena {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: u32,
    staging: Vec<u8>,
    used: u32,
}

impl UniformArena {
    /// Largest uniform block of any program
    pub fn max_block_size() -> u64 {
        ProgramId::ALL
            .iter()
            .map(|program| program.desc().params.size())
            .max()
            .unwrap_or(16)
    }

    /// Room for `capacity` passes per frame
    pub fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(Self::max_block_size(), alignment);
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pass Uniform Arena"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        debug!(
            "Uniform arena: {} slots x {} bytes",
            capacity, stride
        );
        Self {
            buffer,
            stride,
            capacity,
            staging: vec![0; (stride * capacity as u64) as usize],
            used: 0,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn begin_frame(&mut self) {
        self.used = 0;
    }

    /// Stage one pass's packed parameters; returns its dynamic offset
    pub fn push(&mut self, bytes: &[u8]) -> Result<u32> {
        if self.used >= self.capacity {
            return Err(Error::setup(
                "uniform arena",
                format!("more than {} passes in one frame", self.capacity),
            ));
        }
        let offset = self.used as u64 * self.stride;
        let start = offset as usize;
        let len = bytes.len().min(self.stride as usize);
        self.staging[start..start + len].copy_from_slice(&bytes[..len]);
        self.used += 1;
        Ok(offset as u32)
    }

    /// Upload everything staged this frame. Must run before the submit.
    pub fn flush(&self, queue: &wgpu::Queue) {
        if self.used == 0 {
            return;
        }
        let end = (self.used as u64 * self.stride) as usize;
        queue.write_buffer(&self.buffer, 0, &self.staging[..end]);
    }
}
