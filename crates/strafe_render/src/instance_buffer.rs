//! GPU uniform buffer holding every entity's instance record
//!
//! One buffer sized `capacity × stride`, bound once with a dynamic offset;
//! the renderer rebinds per entity by offset instead of per-entity buffers.

use strafe_core::instance::{InstanceData, InstanceStaging};
use tracing::error;

pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: u64,
    stride: u32,
}

impl InstanceBuffer {
    /// Allocate the GPU buffer matching a staging buffer's layout and bind
    /// it against the entity pipeline's instance layout.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        staging: &InstanceStaging,
        label: &str,
    ) -> Self {
        let size = staging.size() as u64;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(InstanceData::SIZE as u64),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            size,
            stride: staging.stride() as u32,
        }
    }

    /// Copy the whole staging buffer to the GPU. A staging buffer of the
    /// wrong size (a different pool's) is rejected with a logged error.
    pub fn upload(&self, queue: &wgpu::Queue, staging: &InstanceStaging) {
        if staging.size() as u64 != self.size {
            error!(
                buffer = %staging.label(),
                declared_size = self.size,
                staged_size = staging.size(),
                "instance upload size mismatch, skipped"
            );
            return;
        }
        queue.write_buffer(&self.buffer, 0, staging.bytes());
    }

    #[inline]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Byte distance between consecutive entities' regions.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }
}
