//! Fixed-capacity entity pool with per-group membership lists
//!
//! The pool owns a slot array fixed at creation, a LIFO free stack, and one
//! insertion-ordered membership list per dispatch group. Spawning pops the
//! free stack and appends to a group list; despawning returns the slot and
//! bumps its generation so stale handles stop resolving.
//!
//! Traversals (the per-tick step and the collision sweep) walk the group
//! lists through a cursor stack owned by the pool. `despawn` retargets any
//! live cursor into the affected list, so a behavior or collision callback
//! may destroy the entity currently being visited (or any other) without
//! the enclosing loop skipping or double-visiting a survivor.

use crate::entity::{Behavior, Entity};
use crate::handle::EntityId;
use glam::Vec3;
use serde::Serialize;
use tracing::warn;

/// Number of dispatch groups. Valid group ids are `0..GROUP_COUNT`.
///
/// Groups partition entities for update order, draw order, and collision
/// handler lookup. The shooter uses a handful (backdrop, player, shots,
/// enemies); 32 leaves headroom without costing anything per frame.
pub const GROUP_COUNT: usize = 32;

struct Slot<D> {
    generation: u32,
    entity: Option<Entity<D>>,
}

/// In-progress traversal position: the next list index to visit.
#[derive(Clone, Copy)]
struct Cursor {
    group: u8,
    next: usize,
}

/// Pool usage snapshot for diagnostics output.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub live: usize,
    pub free: usize,
    pub per_group: Vec<usize>,
}

pub struct EntityPool<D> {
    slots: Vec<Slot<D>>,
    free: Vec<u32>,
    groups: Vec<Vec<EntityId>>,
    cursors: Vec<Cursor>,
}

impl<D> EntityPool<D> {
    /// Create a pool with a fixed number of slots. Capacity never changes;
    /// a full pool rejects spawns instead of growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                generation: 0,
                entity: None,
            });
        }
        // Reverse order so the first spawn takes slot 0.
        let free = (0..capacity as u32).rev().collect();
        Self {
            slots,
            free,
            groups: (0..GROUP_COUNT).map(|_| Vec::new()).collect(),
            cursors: Vec::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entities across all groups.
    #[inline]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of live entities in one group; 0 for out-of-range groups.
    pub fn group_len(&self, group: u8) -> usize {
        self.groups
            .get(group as usize)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a handle. Stale or foreign handles return `None`.
    pub fn get(&self, id: EntityId) -> Option<&Entity<D>> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<D>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Spawn an entity with no behavior callback.
    ///
    /// Returns `None` (with a logged warning and no state change) when the
    /// group id is out of range or the pool is exhausted.
    pub fn spawn(&mut self, group: u8, position: Vec3, display: D) -> Option<EntityId> {
        self.spawn_inner(group, position, display, None)
    }

    /// Spawn an entity with a per-tick behavior callback.
    pub fn spawn_with(
        &mut self,
        group: u8,
        position: Vec3,
        display: D,
        behavior: impl Behavior<D> + 'static,
    ) -> Option<EntityId> {
        self.spawn_inner(group, position, display, Some(Box::new(behavior)))
    }

    fn spawn_inner(
        &mut self,
        group: u8,
        position: Vec3,
        display: D,
        behavior: Option<Box<dyn Behavior<D>>>,
    ) -> Option<EntityId> {
        if group as usize >= GROUP_COUNT {
            warn!(group, max = GROUP_COUNT - 1, "spawn rejected: group out of range");
            return None;
        }
        let Some(index) = self.free.pop() else {
            warn!(capacity = self.slots.len(), "spawn rejected: pool exhausted");
            return None;
        };
        let slot = &mut self.slots[index as usize];
        let id = EntityId::new(index, slot.generation);
        let mut entity = Entity::new(id, group, position, display, behavior);
        entity.refresh_world_box();
        slot.entity = Some(entity);
        self.groups[group as usize].push(id);
        Some(id)
    }

    /// Destroy a live entity, releasing its display and behavior and
    /// returning the slot to the free stack.
    ///
    /// Despawning a stale, foreign, or already-dead handle is a logged
    /// warning and a no-op returning `false`, never a panic. If the entity
    /// is under a live traversal cursor, the cursor is retargeted before the
    /// list is edited.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            warn!(%id, "despawn rejected: handle does not belong to this pool");
            return false;
        };
        if slot.generation != id.generation() {
            warn!(%id, "despawn rejected: stale handle");
            return false;
        }
        let Some(entity) = slot.entity.take() else {
            warn!(%id, "despawn rejected: entity already destroyed");
            return false;
        };
        let group = entity.group() as usize;
        drop(entity); // display and behavior released here
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());

        let members = &mut self.groups[group];
        if let Some(pos) = members.iter().position(|&m| m == id) {
            members.remove(pos);
            // A removal before a cursor's next index shifts the list under
            // it; pull the cursor back so it still lands on the first
            // not-yet-visited survivor.
            for cursor in &mut self.cursors {
                if cursor.group as usize == group && pos < cursor.next {
                    cursor.next -= 1;
                }
            }
        } else {
            debug_assert!(false, "live entity missing from its group list");
        }
        true
    }

    /// Destroy every live entity. Group lists and the free stack return to
    /// their full-capacity state; slot generations advance as usual.
    pub fn clear(&mut self) {
        for group in 0..GROUP_COUNT {
            while let Some(&id) = self.groups[group].first() {
                self.despawn(id);
            }
        }
    }

    /// Iterate live entities in ascending group order, oldest first within
    /// each group. This is the update, publish, and draw order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<D>> {
        self.groups
            .iter()
            .flat_map(move |members| members.iter().filter_map(move |&id| self.get(id)))
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            live: self.live(),
            free: self.free_count(),
            per_group: self.groups.iter().map(|members| members.len()).collect(),
        }
    }

    /// Advance simulation one tick: per group ascending, per member in list
    /// order, integrate velocity, run the behavior callback, then refresh
    /// the world collision box. Entities spawned into a not-yet-finished
    /// group during the walk are visited this same tick.
    pub(crate) fn step(&mut self, dt: f32) {
        for group in 0..GROUP_COUNT as u8 {
            let cursor = self.push_cursor(group);
            while let Some(id) = self.cursor_take(cursor) {
                let Some(entity) = self.get_mut(id) else {
                    continue;
                };
                entity.position += entity.velocity * dt;
                entity.behavior_changed = false;
                let behavior = entity.behavior.take();
                if let Some(mut behavior) = behavior {
                    behavior.update(self, id, dt);
                    // Restore the checked-out callback unless the entity died
                    // or the callback installed a replacement (or cleared it).
                    if let Some(entity) = self.get_mut(id) {
                        if !entity.behavior_changed && entity.behavior.is_none() {
                            entity.behavior = Some(behavior);
                        }
                    }
                }
                if let Some(entity) = self.get_mut(id) {
                    entity.refresh_world_box();
                }
            }
            self.pop_cursor(cursor);
        }
    }

    /// Begin a traversal of one group list. The returned token addresses
    /// this traversal until `pop_cursor`.
    pub(crate) fn push_cursor(&mut self, group: u8) -> usize {
        debug_assert!((group as usize) < GROUP_COUNT);
        self.cursors.push(Cursor { group, next: 0 });
        self.cursors.len() - 1
    }

    /// Yield the next live member of the traversed list and advance.
    pub(crate) fn cursor_take(&mut self, cursor: usize) -> Option<EntityId> {
        let current = self.cursors[cursor];
        let id = self.groups[current.group as usize]
            .get(current.next)
            .copied()?;
        self.cursors[cursor].next += 1;
        Some(id)
    }

    pub(crate) fn pop_cursor(&mut self, cursor: usize) {
        debug_assert_eq!(cursor, self.cursors.len() - 1, "cursors must nest");
        self.cursors.pop();
    }
}
