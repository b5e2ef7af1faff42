//! Overlay clock.
//!
//! Every timed behavior in the overlay (walk debounce, idle flavors, reconnect
//! delay, floating text lifetime, persistence cadence) reads this one clock, so
//! tests can drive the whole pipeline deterministically through
//! [`crate::systems::time::update_world_time`].

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Seconds since the overlay started.
    pub elapsed: f64,
    /// Seconds covered by the current frame.
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Elapsed time in milliseconds, the unit the animation and network timers use.
    pub fn now_ms(&self) -> f64 {
        self.elapsed * 1000.0
    }
}
