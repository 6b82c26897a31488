//! The entity buffer: pool + collision table + instance staging
//!
//! `EntityBuffer` is what the game loop talks to. Once per frame it runs
//! three phases in strict order: behavior callbacks for every group, then
//! the collision sweep over every registered pair (so collision response
//! sees fully-integrated positions), then the publish step that packs every
//! live entity's transform into the staging buffer. Draw happens afterwards
//! from the same group order.

use crate::collision::{CollisionHandler, CollisionTable};
use crate::entity::{Behavior, Display, Entity};
use crate::handle::EntityId;
use crate::instance::{InstanceData, InstanceStaging};
use crate::pool::{EntityPool, PoolStats};
use glam::{Mat3, Mat4, Vec3};

/// Camera (and optional light) matrices for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransforms {
    pub view: Mat4,
    pub proj: Mat4,
    /// Light-space view-projection for shadow rendering. When absent, every
    /// record's `light_mvp` is identity.
    pub light_vp: Option<Mat4>,
}

impl FrameTransforms {
    pub fn new(view: Mat4, proj: Mat4) -> Self {
        Self {
            view,
            proj,
            light_vp: None,
        }
    }

    pub fn with_light(mut self, light_vp: Mat4) -> Self {
        self.light_vp = Some(light_vp);
        self
    }
}

impl Default for FrameTransforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Fixed-capacity entity buffer with grouped dispatch, pairwise collision
/// handling, and per-instance GPU record staging.
pub struct EntityBuffer<D> {
    pool: EntityPool<D>,
    handlers: CollisionTable<D>,
    instances: InstanceStaging,
}

impl<D> EntityBuffer<D> {
    /// Create a buffer for at most `capacity` entities. `alignment` is the
    /// device's minimum uniform-buffer offset alignment; `label` names the
    /// instance buffer in diagnostics.
    pub fn new(capacity: usize, alignment: usize, label: impl Into<String>) -> Self {
        Self {
            pool: EntityPool::with_capacity(capacity),
            handlers: CollisionTable::new(),
            instances: InstanceStaging::new(capacity, alignment, label),
        }
    }

    #[inline]
    pub fn pool(&self) -> &EntityPool<D> {
        &self.pool
    }

    #[inline]
    pub fn pool_mut(&mut self) -> &mut EntityPool<D> {
        &mut self.pool
    }

    pub fn spawn(&mut self, group: u8, position: Vec3, display: D) -> Option<EntityId> {
        self.pool.spawn(group, position, display)
    }

    pub fn spawn_with(
        &mut self,
        group: u8,
        position: Vec3,
        display: D,
        behavior: impl Behavior<D> + 'static,
    ) -> Option<EntityId> {
        self.pool.spawn_with(group, position, display, behavior)
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.pool.despawn(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity<D>> {
        self.pool.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<D>> {
        self.pool.get_mut(id)
    }

    /// Register (or replace) the collision handler for an unordered group
    /// pair.
    pub fn set_collision_handler(
        &mut self,
        a: u8,
        b: u8,
        handler: impl CollisionHandler<D> + 'static,
    ) {
        self.handlers.set(a, b, handler);
    }

    pub fn has_collision_handler(&self, a: u8, b: u8) -> bool {
        self.handlers.contains(a, b)
    }

    /// Drop all collision handlers (level transitions).
    pub fn clear_collision_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Advance the simulation one frame: behavior callbacks in group order,
    /// then the collision sweep, then the instance publish.
    pub fn update(&mut self, dt: f32, frame: &FrameTransforms) {
        self.pool.step(dt);
        self.handlers.dispatch(&mut self.pool);
        self.publish(frame);
    }

    /// Pack every live entity's transform into its reserved staging region.
    /// Dead slots are never written, so a destroyed entity cannot leave a
    /// fresh record behind.
    fn publish(&mut self, frame: &FrameTransforms) {
        let view_proj = frame.proj * frame.view;
        let pool = &self.pool;
        let instances = &mut self.instances;
        for entity in pool.iter() {
            let model = Mat4::from_scale_rotation_translation(
                entity.scale,
                entity.rotation,
                entity.position,
            );
            let normal = Mat3::from_quat(entity.rotation);
            let record = InstanceData {
                mvp: view_proj * model,
                model,
                normal: [
                    normal.x_axis.extend(0.0),
                    normal.y_axis.extend(0.0),
                    normal.z_axis.extend(0.0),
                ],
                color: entity.color,
                light_mvp: frame
                    .light_vp
                    .map(|vp| vp * model)
                    .unwrap_or(Mat4::IDENTITY),
            };
            instances.write(entity.id().index(), &record);
        }
    }

    /// Live entities in ascending group order (update/publish/draw order).
    pub fn iter(&self) -> impl Iterator<Item = &Entity<D>> {
        self.pool.iter()
    }

    /// The staged instance bytes for upload.
    #[inline]
    pub fn instances(&self) -> &InstanceStaging {
        &self.instances
    }

    /// Byte offset of a live entity's region in the instance buffer.
    pub fn instance_offset(&self, id: EntityId) -> Option<usize> {
        self.pool.get(id)?;
        Some(self.instances.offset_of(id.index()))
    }

    /// Destroy every entity. Collision handlers stay registered; use
    /// [`clear_collision_handlers`](Self::clear_collision_handlers) as well
    /// when tearing down a level.
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<D: Display> EntityBuffer<D> {
    /// Live entities with a complete display, in draw order. Entities
    /// missing any display piece are skipped silently.
    pub fn visible(&self) -> impl Iterator<Item = &Entity<D>> {
        self.pool.iter().filter(|entity| entity.display.visible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aabb::Aabb;
    use glam::{Quat, Vec4};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn boxed(buffer: &mut EntityBuffer<()>, group: u8, position: Vec3) -> EntityId {
        let id = buffer.spawn(group, position, ()).unwrap();
        buffer.get_mut(id).unwrap().local_box = Aabb::from_half_extent(Vec3::splat(0.5));
        id
    }

    #[test]
    fn overlap_dispatches_once_smaller_group_first() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(Vec::new()));

        // Registered large-id-first on purpose; dispatch still passes the
        // group-2 entity as the first argument.
        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            5,
            2,
            move |_pool: &mut EntityPool<()>, a: EntityId, b: EntityId| {
                calls_in_handler.borrow_mut().push((a, b));
            },
        );

        let in_five = boxed(&mut buffer, 5, Vec3::ZERO);
        let in_two = boxed(&mut buffer, 2, Vec3::new(0.5, 0.0, 0.0));

        buffer.update(0.0, &FrameTransforms::default());
        assert_eq!(*calls.borrow(), vec![(in_two, in_five)]);
    }

    #[test]
    fn handler_destroying_left_entity_stops_its_sweep() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(0u32));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            2,
            5,
            move |pool: &mut EntityPool<()>, a: EntityId, _b: EntityId| {
                *calls_in_handler.borrow_mut() += 1;
                pool.despawn(a);
            },
        );

        let left = boxed(&mut buffer, 2, Vec3::ZERO);
        // Two overlapping right-group entities; the handler only ever sees one.
        boxed(&mut buffer, 5, Vec3::new(0.25, 0.0, 0.0));
        boxed(&mut buffer, 5, Vec3::new(-0.25, 0.0, 0.0));

        let free_before = buffer.stats().free;
        buffer.update(0.0, &FrameTransforms::default());

        assert_eq!(*calls.borrow(), 1);
        assert!(!buffer.pool().contains(left));
        assert_eq!(buffer.stats().free, free_before + 1);
        assert_eq!(buffer.pool().group_len(5), 2);
    }

    #[test]
    fn handler_destroying_right_entities_keeps_sweeping() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(0u32));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            2,
            5,
            move |pool: &mut EntityPool<()>, _a: EntityId, b: EntityId| {
                *calls_in_handler.borrow_mut() += 1;
                pool.despawn(b);
            },
        );

        let left = boxed(&mut buffer, 2, Vec3::ZERO);
        boxed(&mut buffer, 5, Vec3::new(0.25, 0.0, 0.0));
        boxed(&mut buffer, 5, Vec3::new(-0.25, 0.0, 0.0));

        buffer.update(0.0, &FrameTransforms::default());

        // Destroying the right entity retargets the inner cursor; the sweep
        // still reaches the second overlapping enemy.
        assert_eq!(*calls.borrow(), 2);
        assert!(buffer.pool().contains(left));
        assert_eq!(buffer.pool().group_len(5), 0);
    }

    #[test]
    fn logic_only_entities_are_never_visible() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(4, 256, "test");
        buffer.spawn(0, Vec3::ZERO, ()).unwrap();
        buffer.spawn(1, Vec3::ZERO, ()).unwrap();
        assert_eq!(buffer.visible().count(), 0);
        assert_eq!(buffer.iter().count(), 2);
    }

    #[test]
    fn separated_boxes_never_dispatch() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(0u32));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            0,
            1,
            move |_pool: &mut EntityPool<()>, _a: EntityId, _b: EntityId| {
                *calls_in_handler.borrow_mut() += 1;
            },
        );

        boxed(&mut buffer, 0, Vec3::ZERO);
        boxed(&mut buffer, 1, Vec3::new(100.0, 0.0, 0.0));

        for _ in 0..3 {
            buffer.update(0.016, &FrameTransforms::default());
        }
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn default_empty_boxes_never_dispatch() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(0u32));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            0,
            1,
            move |_pool: &mut EntityPool<()>, _a: EntityId, _b: EntityId| {
                *calls_in_handler.borrow_mut() += 1;
            },
        );

        // Same position, but neither entity ever set a collision box.
        buffer.spawn(0, Vec3::ZERO, ()).unwrap();
        buffer.spawn(1, Vec3::ZERO, ()).unwrap();

        buffer.update(0.016, &FrameTransforms::default());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn self_destroying_behavior_survives_following_frames() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(4, 256, "test");
        let id = buffer
            .spawn_with(
                0,
                Vec3::ZERO,
                (),
                |pool: &mut EntityPool<()>, id: EntityId, _dt: f32| {
                    pool.despawn(id);
                },
            )
            .unwrap();

        for frame in 0..3 {
            buffer.update(0.016, &FrameTransforms::default());
            assert!(!buffer.pool().contains(id), "frame {frame}");
            assert_eq!(buffer.stats().live, 0);
        }
    }

    #[test]
    fn same_group_pair_skips_self_contact() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(8, 256, "test");
        let calls = Rc::new(RefCell::new(Vec::new()));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            3,
            3,
            move |_pool: &mut EntityPool<()>, a: EntityId, b: EntityId| {
                calls_in_handler.borrow_mut().push((a, b));
            },
        );

        let a = boxed(&mut buffer, 3, Vec3::ZERO);
        let b = boxed(&mut buffer, 3, Vec3::new(0.5, 0.0, 0.0));

        buffer.update(0.0, &FrameTransforms::default());
        // Both orderings of the distinct pair, no (x, x) contacts.
        assert_eq!(*calls.borrow(), vec![(a, b), (b, a)]);
    }

    #[test]
    fn publish_writes_live_records_in_reserved_regions() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(4, 256, "test");
        let moving = buffer.spawn(1, Vec3::new(2.0, 0.0, 0.0), ()).unwrap();
        let tinted = buffer.spawn(0, Vec3::ZERO, ()).unwrap();
        buffer.get_mut(tinted).unwrap().color = Vec4::new(1.0, 0.0, 0.0, 1.0);

        let frame = FrameTransforms::new(Mat4::IDENTITY, Mat4::IDENTITY);
        buffer.update(0.0, &frame);

        let moving_record = buffer
            .instances()
            .read(moving.index())
            .expect("record in range");
        assert_eq!(
            moving_record.model,
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
        );
        assert_eq!(moving_record.mvp, moving_record.model);
        assert_eq!(moving_record.light_mvp, Mat4::IDENTITY);

        let tinted_record = buffer.instances().read(tinted.index()).unwrap();
        assert_eq!(tinted_record.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn publish_includes_light_matrix_when_supplied() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(2, 256, "test");
        let id = buffer.spawn(0, Vec3::new(1.0, 0.0, 0.0), ()).unwrap();

        let light_vp = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 50.0);
        let frame = FrameTransforms::default().with_light(light_vp);
        buffer.update(0.0, &frame);

        let record = buffer.instances().read(id.index()).unwrap();
        assert_eq!(
            record.light_mvp,
            light_vp * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
        );
    }

    #[test]
    fn rotation_feeds_normal_matrix_not_collision() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(2, 256, "test");
        let id = buffer.spawn(0, Vec3::ZERO, ()).unwrap();
        {
            let entity = buffer.get_mut(id).unwrap();
            entity.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
            entity.local_box = Aabb::from_half_extent(Vec3::new(2.0, 1.0, 1.0));
        }
        buffer.update(0.0, &FrameTransforms::default());

        // The world box is the translated local box, unrotated.
        let world = buffer.get(id).unwrap().world_box();
        assert_eq!(world.min, Vec3::new(-2.0, -1.0, -1.0));
        assert_eq!(world.max, Vec3::new(2.0, 1.0, 1.0));

        // The record's normal matrix carries the rotation.
        let record = buffer.instances().read(id.index()).unwrap();
        assert!((record.normal[0].y - 1.0).abs() < 1e-6);
        assert!(record.normal[0].x.abs() < 1e-6);
    }

    #[test]
    fn instance_offset_resolves_only_live_entities() {
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(4, 256, "test");
        let id = buffer.spawn(0, Vec3::ZERO, ()).unwrap();
        assert_eq!(
            buffer.instance_offset(id),
            Some(id.index() as usize * buffer.instances().stride())
        );
        buffer.despawn(id);
        assert_eq!(buffer.instance_offset(id), None);
    }

    #[test]
    fn collision_runs_after_every_group_integrated() {
        // The group-0 entity moves into overlap during this same frame's
        // integration; the sweep must see the integrated position.
        let mut buffer: EntityBuffer<()> = EntityBuffer::new(4, 256, "test");
        let calls = Rc::new(RefCell::new(0u32));

        let calls_in_handler = calls.clone();
        buffer.set_collision_handler(
            0,
            1,
            move |_pool: &mut EntityPool<()>, _a: EntityId, _b: EntityId| {
                *calls_in_handler.borrow_mut() += 1;
            },
        );

        let mover = boxed(&mut buffer, 0, Vec3::new(-2.0, 0.0, 0.0));
        boxed(&mut buffer, 1, Vec3::ZERO);
        buffer.get_mut(mover).unwrap().velocity = Vec3::new(2.0, 0.0, 0.0);

        buffer.update(1.0, &FrameTransforms::default());
        assert_eq!(*calls.borrow(), 1);
    }
}
