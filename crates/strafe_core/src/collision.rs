//! Pairwise collision dispatch between entity groups
//!
//! A flat association list maps an unordered pair of group ids to a handler
//! callback. Every tick, after all behavior callbacks have run, each
//! registered pair is swept: every live member of the left (smaller-id)
//! group is tested against every live member of the right group with the
//! non-strict AABB overlap test, and the handler runs for each overlapping
//! pair. Handlers may mutate, spawn, and despawn freely; the pool's cursor
//! retargeting keeps the sweep consistent under removal.

use crate::handle::EntityId;
use crate::pool::{EntityPool, GROUP_COUNT};
use tracing::warn;

/// Collision callback, run once per overlapping pair per tick.
///
/// `a` always belongs to the numerically smaller group id of the registered
/// pair, regardless of the order the pair was registered in.
pub trait CollisionHandler<D> {
    fn on_contact(&mut self, pool: &mut EntityPool<D>, a: EntityId, b: EntityId);
}

impl<D, F> CollisionHandler<D> for F
where
    F: FnMut(&mut EntityPool<D>, EntityId, EntityId),
{
    fn on_contact(&mut self, pool: &mut EntityPool<D>, a: EntityId, b: EntityId) {
        self(pool, a, b)
    }
}

struct HandlerEntry<D> {
    groups: (u8, u8),
    handler: Box<dyn CollisionHandler<D>>,
}

/// Registry of group-pair collision handlers.
pub struct CollisionTable<D> {
    entries: Vec<HandlerEntry<D>>,
}

impl<D> CollisionTable<D> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a handler for an unordered group pair. At most one handler
    /// exists per pair; registering again replaces it. Out-of-range group
    /// ids are logged and ignored.
    pub fn set(&mut self, a: u8, b: u8, handler: impl CollisionHandler<D> + 'static) {
        let Some(groups) = Self::normalize(a, b) else {
            return;
        };
        let handler = Box::new(handler);
        match self.entries.iter_mut().find(|e| e.groups == groups) {
            Some(entry) => entry.handler = handler,
            None => self.entries.push(HandlerEntry { groups, handler }),
        }
    }

    /// Whether a handler is registered for the unordered pair.
    pub fn contains(&self, a: u8, b: u8) -> bool {
        Self::normalize(a, b)
            .map(|groups| self.entries.iter().any(|e| e.groups == groups))
            .unwrap_or(false)
    }

    /// Drop every registered handler (level transitions).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(a: u8, b: u8) -> Option<(u8, u8)> {
        if a as usize >= GROUP_COUNT || b as usize >= GROUP_COUNT {
            warn!(a, b, max = GROUP_COUNT - 1, "collision pair out of range, ignored");
            return None;
        }
        Some((a.min(b), a.max(b)))
    }

    /// Run every registered handler against this tick's world boxes.
    ///
    /// For each pair the sweep walks left group × right group through pool
    /// cursors. The left box is re-read every comparison so handler
    /// mutations are observed immediately; when a handler destroys the left
    /// entity, the rest of that entity's inner loop is abandoned. Empty
    /// boxes and self-pairs never collide.
    pub(crate) fn dispatch(&mut self, pool: &mut EntityPool<D>) {
        for entry in &mut self.entries {
            let (left_group, right_group) = entry.groups;
            let left_cursor = pool.push_cursor(left_group);
            'left: while let Some(left) = pool.cursor_take(left_cursor) {
                let right_cursor = pool.push_cursor(right_group);
                while let Some(right) = pool.cursor_take(right_cursor) {
                    if left == right {
                        continue;
                    }
                    let Some(left_entity) = pool.get(left) else {
                        // Destroyed by an earlier contact this sweep.
                        pool.pop_cursor(right_cursor);
                        continue 'left;
                    };
                    let left_box = left_entity.world_box();
                    let Some(right_entity) = pool.get(right) else {
                        continue;
                    };
                    let right_box = right_entity.world_box();
                    if left_box.is_empty() || right_box.is_empty() {
                        continue;
                    }
                    if !left_box.intersects(&right_box) {
                        continue;
                    }
                    entry.handler.on_contact(pool, left, right);
                    if !pool.contains(left) {
                        break;
                    }
                }
                pool.pop_cursor(right_cursor);
            }
            pool.pop_cursor(left_cursor);
        }
    }
}

impl<D> Default for CollisionTable<D> {
    fn default() -> Self {
        Self::new()
    }
}
