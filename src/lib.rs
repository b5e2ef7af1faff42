//! RPG overlay library.
//!
//! Exposes the overlay's ECS components, resources, systems and events for
//! the binary and the integration tests.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
