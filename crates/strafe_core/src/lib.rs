//! Strafe Engine Core
//!
//! The simulation heart of the engine:
//! - Fixed-capacity entity pool with per-group dispatch lists
//! - Pairwise AABB collision handling with a group-pair handler table
//! - Per-instance GPU record packing (CPU staging side)
//! - Fixed-tick simulation time

pub mod aabb;
pub mod buffer;
pub mod collision;
pub mod entity;
pub mod handle;
pub mod instance;
pub mod pool;
pub mod time;

pub use glam;

pub use aabb::Aabb;
pub use buffer::{EntityBuffer, FrameTransforms};
pub use collision::{CollisionHandler, CollisionTable};
pub use entity::{Behavior, Display, Entity};
pub use handle::EntityId;
pub use instance::{InstanceData, InstanceStaging};
pub use pool::{EntityPool, PoolStats, GROUP_COUNT};
pub use time::TickClock;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
