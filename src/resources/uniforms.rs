//! Dynamic-offset uniform arenas.
//!
//! Per-draw data (instance transforms, bone palettes, debug shapes, shadow
//! faces) is packed into one buffer per kind and addressed with a dynamic
//! offset, so a frame needs one bind group per arena instead of one per draw.

use std::{marker::PhantomData, num::NonZeroU64};

/// Rounds `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

pub fn binding_size<T>() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<T>() as u64)
}

#[derive(Debug)]
pub struct UniformArena<T: bytemuck::Pod> {
    label: String,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
    staging: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformArena<T> {
    /// `layout` must have a single dynamic uniform buffer at binding 0.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u32,
        label: &str,
    ) -> Self {
        let stride = aligned_stride(
            std::mem::size_of::<T>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(device, layout, stride, capacity, label);
        Self {
            label: label.to_string(),
            layout: layout.clone(),
            buffer,
            bind_group,
            stride,
            capacity,
            staging: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u32,
        label: &str,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: binding_size::<T>(),
                }),
            }],
            label: Some(label),
        });
        (buffer, bind_group)
    }

    /// Uploads `items` to slots `0..items.len()`, growing the arena first
    /// when it is too small.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        if items.is_empty() {
            return;
        }
        let needed = items.len() as u32;
        if needed > self.capacity {
            let capacity = needed.max(self.capacity * 2);
            log::debug!(
                "growing {} from {} to {} slots",
                self.label,
                self.capacity,
                capacity
            );
            let (buffer, bind_group) =
                Self::allocate(device, &self.layout, self.stride, capacity, &self.label);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        self.staging.clear();
        self.staging.resize(self.stride as usize * items.len(), 0);
        for (chunk, item) in self.staging.chunks_exact_mut(self.stride as usize).zip(items) {
            let bytes = bytemuck::bytes_of(item);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    pub fn offset(&self, index: usize) -> wgpu::DynamicOffset {
        (index as u64 * self.stride) as wgpu::DynamicOffset
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
