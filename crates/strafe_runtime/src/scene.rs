//! The demo scene: a top-down shooter in four groups
//!
//! Group ids double as update and draw order: backdrop first, then the
//! player, shots, and enemies. The spawner is a logic-only entity with no
//! sprite and no collision box; it exists purely for its behavior callback.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};
use strafe_core::aabb::Aabb;
use strafe_core::buffer::{EntityBuffer, FrameTransforms};
use strafe_core::handle::EntityId;
use strafe_core::pool::EntityPool;
use strafe_render::Sprite;

use crate::config::DemoConfig;

pub const GROUP_BACKDROP: u8 = 0;
pub const GROUP_PLAYER: u8 = 1;
pub const GROUP_PLAYER_SHOT: u8 = 2;
pub const GROUP_ENEMY: u8 = 3;

/// Sprite prototypes for each role. Defaults are all-empty sprites, which
/// keeps the whole scene logic-only when no GPU is available.
#[derive(Clone, Default)]
pub struct SceneSprites {
    pub backdrop: Sprite,
    pub player: Sprite,
    pub shot: Sprite,
    pub enemy: Sprite,
}

/// Shared tallies incremented from behaviors and collision handlers.
#[derive(Clone, Default)]
pub struct SceneCounters {
    pub shots_fired: Rc<Cell<u32>>,
    pub enemies_spawned: Rc<Cell<u32>>,
    pub enemies_downed: Rc<Cell<u32>>,
    pub player_hits: Rc<Cell<u32>>,
}

/// Top-down camera and a slanted key light over the arena.
pub fn camera(config: &DemoConfig) -> FrameTransforms {
    let half = config.arena_half_extent * 1.1;
    let view = Mat4::look_at_rh(Vec3::new(0.0, 40.0, 0.0), Vec3::ZERO, Vec3::NEG_Z);
    let proj = Mat4::orthographic_rh(-half, half, -half, half, 0.1, 100.0);
    let light_view = Mat4::look_at_rh(Vec3::new(15.0, 30.0, 10.0), Vec3::ZERO, Vec3::Y);
    let light_proj = Mat4::orthographic_rh(-half, half, -half, half, 0.1, 100.0);
    FrameTransforms::new(view, proj).with_light(light_proj * light_view)
}

/// Build the scene: backdrop, player, enemy spawner, and the collision
/// handlers wiring shots and enemies together.
pub fn populate(
    buffer: &mut EntityBuffer<Sprite>,
    config: &DemoConfig,
    sprites: SceneSprites,
) -> SceneCounters {
    let counters = SceneCounters::default();
    let arena = config.arena_half_extent;

    // Backdrop: one big ground quad, no box, no behavior.
    if let Some(id) = buffer.spawn(GROUP_BACKDROP, Vec3::new(0.0, -0.1, 0.0), sprites.backdrop) {
        if let Some(backdrop) = buffer.get_mut(id) {
            backdrop.scale = Vec3::new(arena * 2.0, 1.0, arena * 2.0);
            backdrop.color = Vec4::new(0.12, 0.12, 0.16, 1.0);
        }
    }

    // Player: strafes on a sine wave and fires on a fixed cadence.
    let shot_sprite = sprites.shot;
    let shots_fired = counters.shots_fired.clone();
    let fire_interval = config.fire_interval.max(0.05);
    let mut strafe_phase = 0.0f32;
    let mut cooldown = fire_interval;
    let player = buffer.spawn_with(
        GROUP_PLAYER,
        Vec3::ZERO,
        sprites.player,
        move |pool: &mut EntityPool<Sprite>, id: EntityId, dt: f32| {
            strafe_phase += dt;
            let mut muzzle = Vec3::ZERO;
            if let Some(player) = pool.get_mut(id) {
                player.velocity.x = (strafe_phase * 1.5).sin() * 6.0;
                muzzle = player.position + Vec3::new(0.0, 0.0, -1.0);
            }
            cooldown -= dt;
            if cooldown <= 0.0 {
                cooldown += fire_interval;
                let spawned = pool.spawn_with(
                    GROUP_PLAYER_SHOT,
                    muzzle,
                    shot_sprite.clone(),
                    move |pool: &mut EntityPool<Sprite>, id: EntityId, _dt: f32| {
                        let gone = pool
                            .get(id)
                            .map(|shot| shot.position.z < -arena)
                            .unwrap_or(false);
                        if gone {
                            pool.despawn(id);
                        }
                    },
                );
                if let Some(shot_id) = spawned {
                    if let Some(shot) = pool.get_mut(shot_id) {
                        shot.velocity = Vec3::new(0.0, 0.0, -18.0);
                        shot.scale = Vec3::new(0.2, 1.0, 0.6);
                        shot.color = Vec4::new(1.0, 0.9, 0.3, 1.0);
                        shot.local_box = Aabb::from_half_extent(Vec3::new(0.15, 0.5, 0.3));
                    }
                    shots_fired.set(shots_fired.get() + 1);
                }
            }
        },
    );
    if let Some(player) = player.and_then(|id| buffer.get_mut(id)) {
        player.color = Vec4::new(0.3, 0.9, 1.0, 1.0);
        player.local_box = Aabb::from_half_extent(Vec3::new(0.6, 0.5, 0.6));
    }

    // Enemy spawner: logic-only, cycles through five lanes.
    let enemy_sprite = sprites.enemy;
    let enemies_spawned = counters.enemies_spawned.clone();
    let enemy_interval = config.enemy_interval.max(0.1);
    let mut lane = 0i32;
    let mut spawn_timer = enemy_interval;
    let _ = buffer.spawn_with(
        GROUP_BACKDROP,
        Vec3::ZERO,
        Sprite::default(),
        move |pool: &mut EntityPool<Sprite>, _id: EntityId, dt: f32| {
            spawn_timer -= dt;
            if spawn_timer > 0.0 {
                return;
            }
            spawn_timer += enemy_interval;
            lane = (lane + 1) % 5;
            let x = (lane - 2) as f32 * arena / 3.0;

            let mut weave_phase = lane as f32;
            let spawned = pool.spawn_with(
                GROUP_ENEMY,
                Vec3::new(x, 0.0, -arena),
                enemy_sprite.clone(),
                move |pool: &mut EntityPool<Sprite>, id: EntityId, dt: f32| {
                    weave_phase += dt * 2.0;
                    let escaped = match pool.get_mut(id) {
                        Some(enemy) => {
                            enemy.velocity.x = weave_phase.cos() * 3.0;
                            enemy.position.z > arena
                        }
                        None => false,
                    };
                    if escaped {
                        pool.despawn(id);
                    }
                },
            );
            if let Some(enemy_id) = spawned {
                if let Some(enemy) = pool.get_mut(enemy_id) {
                    enemy.velocity = Vec3::new(0.0, 0.0, 5.0);
                    enemy.color = Vec4::new(1.0, 0.35, 0.3, 1.0);
                    enemy.local_box = Aabb::from_half_extent(Vec3::new(0.7, 0.5, 0.7));
                }
                enemies_spawned.set(enemies_spawned.get() + 1);
            }
        },
    );

    // Shots destroy enemies; both disappear on contact.
    let enemies_downed = counters.enemies_downed.clone();
    buffer.set_collision_handler(
        GROUP_PLAYER_SHOT,
        GROUP_ENEMY,
        move |pool: &mut EntityPool<Sprite>, shot: EntityId, enemy: EntityId| {
            pool.despawn(shot);
            pool.despawn(enemy);
            enemies_downed.set(enemies_downed.get() + 1);
        },
    );

    // Enemies that reach the player burn up on its shield.
    let player_hits = counters.player_hits.clone();
    buffer.set_collision_handler(
        GROUP_PLAYER,
        GROUP_ENEMY,
        move |pool: &mut EntityPool<Sprite>, _player: EntityId, enemy: EntityId| {
            pool.despawn(enemy);
            player_hits.set(player_hits.get() + 1);
        },
    );

    counters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(frames: u64) -> (EntityBuffer<Sprite>, SceneCounters, DemoConfig) {
        let config = DemoConfig::default();
        let mut buffer: EntityBuffer<Sprite> =
            EntityBuffer::new(config.capacity, 256, "scene test");
        let counters = populate(&mut buffer, &config, SceneSprites::default());
        let frame = camera(&config);
        let dt = 1.0 / config.tick_hz as f32;
        for _ in 0..frames {
            buffer.update(dt, &frame);
        }
        (buffer, counters, config)
    }

    #[test]
    fn scene_runs_and_fires() {
        let (buffer, counters, config) = run_frames(300);
        assert!(counters.shots_fired.get() > 0);
        assert!(counters.enemies_spawned.get() > 0);
        let stats = buffer.stats();
        assert_eq!(stats.live + stats.free, config.capacity);
        assert!(stats.live <= config.capacity);
    }

    #[test]
    fn shots_despawn_past_the_arena_edge() {
        // Long run: if shots leaked, 600 frames at 4 shots/sec against a
        // 256-slot pool would still be fine, but the shot group would keep
        // growing. It must stay bounded by flight time × fire rate.
        let (buffer, _counters, config) = run_frames(600);
        let flight_time = 2.0 * config.arena_half_extent / 18.0;
        let bound = (flight_time / config.fire_interval).ceil() as usize + 2;
        assert!(buffer.pool().group_len(GROUP_PLAYER_SHOT) <= bound);
    }
}
