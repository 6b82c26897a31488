//! Headless GPU context acquisition
//!
//! Window/surface management belongs to the embedding application; the
//! engine only needs a device, a queue, and the device's uniform-offset
//! alignment (which sizes the per-entity stride).

use crate::error::RenderError;
use tracing::info;

/// Device, queue, and the limits the entity buffer cares about.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Minimum uniform-buffer offset alignment; pass this to
    /// `EntityBuffer::new` so per-entity regions are bindable.
    pub uniform_alignment: usize,
}

impl GpuContext {
    /// Acquire a device with no surface attached. Works on build agents and
    /// in tests as long as any adapter (including a software fallback)
    /// exists.
    pub async fn headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            "acquired GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("strafe device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as usize;
        Ok(Self {
            device,
            queue,
            uniform_alignment,
        })
    }
}
