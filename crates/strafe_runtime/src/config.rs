//! Demo configuration
//!
//! Loaded from a JSON file next to the binary; any missing or malformed
//! field falls back to the default so the demo always starts.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Entity pool capacity.
    pub capacity: usize,
    /// Simulation rate in ticks per second.
    pub tick_hz: u32,
    /// Number of ticks the demo runs before exiting.
    pub frames: u64,
    /// Half extent of the square play field, in world units.
    pub arena_half_extent: f32,
    /// Seconds between player shots.
    pub fire_interval: f32,
    /// Seconds between enemy spawns.
    pub enemy_interval: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            tick_hz: 60,
            frames: 600,
            arena_half_extent: 20.0,
            fire_interval: 0.25,
            enemy_interval: 0.8,
        }
    }
}

/// Load the config, falling back to defaults when the file is absent or
/// malformed (logged, never fatal).
pub fn load(path: &str) -> DemoConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(config) => {
                info!(path, "loaded demo config");
                config
            }
            Err(err) => {
                warn!(path, %err, "demo config is malformed, using defaults");
                DemoConfig::default()
            }
        },
        Err(_) => DemoConfig::default(),
    }
}
