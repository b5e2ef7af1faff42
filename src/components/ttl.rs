//! Time-to-live for transient overlay entities such as floating dice text.
//!
//! [`crate::systems::ttl::ttl_system`] counts `remaining` down by the scaled
//! frame delta and despawns the entity once it reaches zero.

use bevy_ecs::prelude::Component;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Ttl {
    /// Seconds left before despawn.
    pub remaining: f32,
}

impl Ttl {
    pub fn new(seconds: f32) -> Self {
        Ttl { remaining: seconds }
    }
}
