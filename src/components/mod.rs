//! ECS components of the overlay.
//!
//! Submodules overview:
//! - [`animation`] – walk/idle state machine and the idle flavor scheduler
//! - [`avatar`] – marker for the local character entity
//! - [`floatingtext`] – short-lived text popped over the overlay
//! - [`loadout`] – equipment and appearance selection per layer
//! - [`ttl`] – time-to-live for automatic despawning

pub mod animation;
pub mod avatar;
pub mod floatingtext;
pub mod loadout;
pub mod ttl;
