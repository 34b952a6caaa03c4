//! Fixed-timestep driver loop.
//!
//! Repeatedly calls [`World::run_tick`], sleeping off the rest of each tick's
//! time budget and warning when a tick overruns it.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use brig_ecs::{EcsError, World};

/// Configuration for the driver loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Drives a [`World`] at a fixed tick rate.
#[derive(Debug)]
pub struct TickLoop {
    config: TickConfig,
}

impl TickLoop {
    /// Create a driver with the given configuration.
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self { config }
    }

    /// Run the loop until `max_ticks` is reached (or forever if 0).
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`World::run_tick`] (a scheduling
    /// cycle, detected when the execution plan is first computed).
    pub async fn run(&self, world: &mut World) -> Result<(), EcsError> {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            world.run_tick()?;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                tokio::time::sleep(tick_duration - elapsed).await;
            } else {
                warn!(
                    tick = world.tick_id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        Ok(())
    }
}
