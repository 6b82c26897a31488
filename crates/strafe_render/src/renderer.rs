//! The entity draw pass
//!
//! Walks live entities in ascending group order, the same order update and
//! publish use, so group ids double as draw order (backdrop before player,
//! player before shots). One indexed draw per visible entity; entities with
//! an incomplete sprite are skipped silently.

use crate::instance_buffer::InstanceBuffer;
use crate::resources::Sprite;
use strafe_core::buffer::EntityBuffer;

/// Record one draw per visible entity into an open render pass.
///
/// The instance buffer must already hold this frame's records (update, then
/// upload, then draw).
pub fn draw_entities(
    pass: &mut wgpu::RenderPass<'_>,
    buffer: &EntityBuffer<Sprite>,
    instances: &InstanceBuffer,
) {
    for entity in buffer.visible() {
        let sprite = &entity.display;
        let (Some(mesh), Some(texture), Some(pipeline)) = (
            sprite.mesh.as_ref(),
            sprite.texture.as_ref(),
            sprite.pipeline.as_ref(),
        ) else {
            continue;
        };
        let Some(offset) = buffer.instance_offset(entity.id()) else {
            continue;
        };

        pass.set_pipeline(pipeline.pipeline());
        pass.set_bind_group(0, instances.bind_group(), &[offset as u32]);
        pass.set_bind_group(1, texture.bind_group(), &[]);
        let detail = sprite.detail_texture.as_ref().unwrap_or(texture);
        pass.set_bind_group(2, detail.bind_group(), &[]);
        mesh.draw(pass);
    }
}
