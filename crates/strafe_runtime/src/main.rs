//! Strafe demo runtime
//!
//! Boots logging, loads the demo config, builds the shooter scene, and runs
//! a fixed-tick loop. With a GPU adapter present every frame is rendered
//! offscreen; without one the simulation still runs to completion.

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

use strafe_core::buffer::EntityBuffer;
use strafe_core::time::TickClock;
use strafe_render::{GpuContext, Sprite};

mod config;
mod gpu;
mod scene;

use gpu::DemoRenderer;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("Strafe v{}", strafe_core::VERSION);

    let config = config::load("strafe_demo.json");
    debug!(?config, "demo configuration");

    let context = match pollster::block_on(GpuContext::headless()) {
        Ok(context) => Some(context),
        Err(err) => {
            warn!(%err, "no GPU available, running simulation only");
            None
        }
    };
    let alignment = context.as_ref().map(|c| c.uniform_alignment).unwrap_or(256);

    let mut buffer: EntityBuffer<Sprite> =
        EntityBuffer::new(config.capacity, alignment, "entity instances");
    let renderer = context.map(|context| DemoRenderer::new(context, buffer.instances()));

    let sprites = renderer.as_ref().map(DemoRenderer::sprites).unwrap_or_default();
    let counters = scene::populate(&mut buffer, &config, sprites);
    let frame = scene::camera(&config);

    let mut clock = TickClock::with_rate(config.tick_hz);
    let started = Instant::now();
    for _ in 0..config.frames {
        buffer.update(clock.dt(), &frame);
        if let Some(renderer) = &renderer {
            renderer.render(&buffer);
        }
        clock.advance();

        if clock.tick_count() % 120 == 0 {
            let stats = buffer.stats();
            debug!(
                tick = clock.tick_count(),
                live = stats.live,
                free = stats.free,
                "pool status"
            );
        }
    }
    if let Some(renderer) = &renderer {
        renderer.finish();
    }

    let elapsed = started.elapsed();
    let stats = buffer.stats();
    info!(
        frames = config.frames,
        wall_ms = elapsed.as_millis() as u64,
        fps = (config.frames as f64 / elapsed.as_secs_f64()) as u32,
        live = stats.live,
        shots_fired = counters.shots_fired.get(),
        enemies_spawned = counters.enemies_spawned.get(),
        enemies_downed = counters.enemies_downed.get(),
        player_hits = counters.player_hits.get(),
        "demo finished"
    );

    Ok(())
}
