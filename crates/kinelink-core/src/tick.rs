//! Tick clock for the render cadence
//!
//! Measures elapsed wall time between ticks so motion integrates against
//! real frame spacing rather than a nominal interval.

use std::time::{Duration, Instant};

/// Per-tick elapsed-time source
/// INVARIANT: reported deltas are clamped, NEVER jump after a stall
pub struct TickClock {
    last_update: Instant,
    max_delta: Duration,
}

impl TickClock {
    pub fn new() -> Self {
        TickClock {
            last_update: Instant::now(),
            max_delta: Duration::from_millis(100),
        }
    }

    /// Advance the clock and return the elapsed time since the last tick
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        self.last_update = now;

        // Clamp to prevent large jumps (e.g., after system sleep)
        elapsed.min(self.max_delta)
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
