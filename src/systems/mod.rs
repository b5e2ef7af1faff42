//! ECS systems and the frame helpers around them.
//!
//! Submodules overview:
//! - [`animation`] – wall-clock animation stepping and idle flavors
//! - [`chat`] – logging of chat commands
//! - [`compositor`] – layered character compositing
//! - [`network`] – socket thread, connection polling and event application
//! - [`persistence`] – snapshot restore and periodic save
//! - [`render`] – raylib frontend (feature `window`)
//! - [`time`] – [`crate::resources::worldtime::WorldTime`] advance
//! - [`ttl`] – despawn of expired entities
//! - [`viewport`] – minimap rendering and viewport queries

pub mod animation;
pub mod chat;
pub mod compositor;
pub mod network;
pub mod persistence;
#[cfg(feature = "window")]
pub mod render;
pub mod time;
pub mod ttl;
pub mod viewport;
