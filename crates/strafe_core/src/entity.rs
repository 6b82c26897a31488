//! The entity record and its callback/display seams

use crate::aabb::Aabb;
use crate::handle::EntityId;
use crate::pool::EntityPool;
use glam::{Quat, Vec3, Vec4};

/// Per-entity simulation callback, run once per tick by the pool.
///
/// The callback receives the owning pool and its own id rather than a raw
/// reference, so it can mutate any entity, spawn new ones, or despawn any
/// live entity, including itself, while the pool keeps its traversal
/// consistent. A callback that caches an id across frames sees lookups
/// return `None` after the entity dies, never a different entity.
pub trait Behavior<D> {
    fn update(&mut self, pool: &mut EntityPool<D>, id: EntityId, dt: f32);
}

impl<D, F> Behavior<D> for F
where
    F: FnMut(&mut EntityPool<D>, EntityId, f32),
{
    fn update(&mut self, pool: &mut EntityPool<D>, id: EntityId, dt: f32) {
        self(pool, id, dt)
    }
}

/// Render payload seam.
///
/// The pool is generic over what an entity displays; the render crate
/// supplies a sprite with shared mesh/texture/shader handles. `()` works
/// for logic-only pools and tests and is never visible.
pub trait Display {
    /// True when the entity has everything it needs to be drawn.
    fn visible(&self) -> bool;
}

impl Display for () {
    fn visible(&self) -> bool {
        false
    }
}

/// One simulated, drawable object.
///
/// Records live in place inside the pool's slot array. Transform, velocity,
/// color, and the local collision box are freely mutable; the group and the
/// derived world box are managed by the pool.
pub struct Entity<D> {
    id: EntityId,
    group: u8,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub color: Vec4,
    pub local_box: Aabb,
    world_box: Aabb,
    pub display: D,
    pub(crate) behavior: Option<Box<dyn Behavior<D>>>,
    pub(crate) behavior_changed: bool,
}

impl<D> Entity<D> {
    pub(crate) fn new(
        id: EntityId,
        group: u8,
        position: Vec3,
        display: D,
        behavior: Option<Box<dyn Behavior<D>>>,
    ) -> Self {
        Self {
            id,
            group,
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            color: Vec4::ONE,
            local_box: Aabb::default(),
            world_box: Aabb::default(),
            display,
            behavior,
            behavior_changed: false,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn group(&self) -> u8 {
        self.group
    }

    /// World-space collision box: the local box translated to the current
    /// position. Recomputed by the pool after every behavior callback.
    #[inline]
    pub fn world_box(&self) -> Aabb {
        self.world_box
    }

    pub(crate) fn refresh_world_box(&mut self) {
        self.world_box = self.local_box.translated(self.position);
    }

    /// Install (or replace) the per-tick behavior callback.
    pub fn set_behavior(&mut self, behavior: impl Behavior<D> + 'static) {
        self.behavior = Some(Box::new(behavior));
        self.behavior_changed = true;
    }

    /// Remove the behavior callback; the entity keeps integrating velocity.
    pub fn clear_behavior(&mut self) {
        self.behavior = None;
        self.behavior_changed = true;
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}
