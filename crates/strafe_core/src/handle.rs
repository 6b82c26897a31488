//! Generation-counted entity handles
//!
//! A handle is a slot index into the pool's fixed array plus a generation
//! counter. The generation advances every time a slot is freed, so a handle
//! cached across frames stops resolving once its entity dies; it can never
//! silently alias a newer entity that reused the slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an entity in an [`EntityPool`](crate::pool::EntityPool).
///
/// Format: [32-bit slot index | 32-bit generation]. Two handles with the
/// same index but different generations refer to different entities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Null/invalid handle, useful for "no target" fields.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the owning pool's array.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.index == u32::MAX
    }

    /// Serialize to a 64-bit integer (for save files/telemetry).
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from a 64-bit integer.
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index, self.generation)
        }
    }
}
