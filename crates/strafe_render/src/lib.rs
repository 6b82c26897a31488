//! Strafe Render
//!
//! wgpu-backed drawing for the entity buffer: shared mesh/texture/shader
//! resources, the per-instance uniform buffer with dynamic offsets, and the
//! grouped draw pass. Windowing is out of scope; the context is headless
//! and render targets are whatever the caller attaches.

pub mod context;
pub mod error;
pub mod instance_buffer;
pub mod renderer;
pub mod resources;

pub use wgpu;

pub use context::GpuContext;
pub use error::RenderError;
pub use instance_buffer::InstanceBuffer;
pub use renderer::draw_entities;
pub use resources::{EntityPipeline, Mesh, Sprite, Texture, Vertex};
