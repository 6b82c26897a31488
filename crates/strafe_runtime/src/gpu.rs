//! Offscreen rendering for the demo
//!
//! No window: the demo draws into an offscreen color target every frame,
//! exercising the full update → upload → draw path. Windowed presentation
//! belongs to the embedding application.

use std::sync::Arc;

use strafe_core::buffer::EntityBuffer;
use strafe_core::instance::InstanceStaging;
use strafe_render::{draw_entities, EntityPipeline, GpuContext, InstanceBuffer, Mesh, Sprite, Texture};

use crate::scene::SceneSprites;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const TARGET_WIDTH: u32 = 640;
const TARGET_HEIGHT: u32 = 640;

pub struct DemoRenderer {
    context: GpuContext,
    pipeline: Arc<EntityPipeline>,
    quad: Arc<Mesh>,
    white: Arc<Texture>,
    instances: InstanceBuffer,
    target: wgpu::TextureView,
}

impl DemoRenderer {
    pub fn new(context: GpuContext, staging: &InstanceStaging) -> Self {
        let pipeline = Arc::new(EntityPipeline::new(&context.device, TARGET_FORMAT));
        let quad = Arc::new(Mesh::unit_quad(&context.device, &context.queue));
        let white = Arc::new(Texture::solid(
            &context.device,
            &context.queue,
            pipeline.texture_layout(),
            [255, 255, 255, 255],
            "white",
        ));
        let instances = InstanceBuffer::new(
            &context.device,
            pipeline.instance_layout(),
            staging,
            "entity instances",
        );

        let target_texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("demo target"),
            size: wgpu::Extent3d {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let target = target_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            context,
            pipeline,
            quad,
            white,
            instances,
            target,
        }
    }

    /// Every role draws the shared quad/white-texture sprite; per-entity
    /// color in the instance record tells them apart.
    pub fn sprites(&self) -> SceneSprites {
        let base = Sprite::new(self.quad.clone(), self.white.clone(), self.pipeline.clone());
        SceneSprites {
            backdrop: base.clone(),
            player: base.clone(),
            shot: base.clone(),
            enemy: base,
        }
    }

    /// Upload this frame's instance records and draw every visible entity
    /// into the offscreen target.
    pub fn render(&self, buffer: &EntityBuffer<Sprite>) {
        self.instances.upload(&self.context.queue, buffer.instances());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("demo encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("demo pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.03,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            draw_entities(&mut pass, buffer, &self.instances);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Block until submitted work drains (end of demo).
    pub fn finish(&self) {
        let _ = self.context.device.poll(wgpu::Maintain::Wait);
    }
}
