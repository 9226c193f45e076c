//! A single reused uniform buffer per tile.
//!
//! The teacher's `UniformBufferAllocator` pages a ring of large buffers to
//! amortize many per-frame allocations across a whole scene graph. Each
//! tile here issues exactly one draw per frame, so that machinery would be
//! pure overhead - this is the same "write into a persistent GPU buffer"
//! idea scaled down to the one-allocation-per-tile case.

use std::sync::Arc;

use swiftvj_core::ShaderUniforms;

/// Owns the GPU-side copy of one tile's [`ShaderUniforms`] block.
pub struct UniformBuffer {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl UniformBuffer {
    /// Allocates the buffer and its bind group, label included for GPU
    /// debuggers.
    pub fn new(device: &Arc<wgpu::Device>, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ShaderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label}-bgl")),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bg")),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
        });

        Self { buffer, bind_group_layout, bind_group }
    }

    /// Writes a fresh uniform block to the GPU buffer for this frame.
    pub fn write(&self, queue: &wgpu::Queue, uniforms: &ShaderUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// The bind-group layout every pipeline built against this buffer must
    /// share.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// The bind group to attach at group 0 before drawing.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
