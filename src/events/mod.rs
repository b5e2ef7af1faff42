//! Messages flowing into and around the overlay.
//!
//! Submodules overview:
//! - [`chat`] – chat lines from the overlay host
//! - [`network`] – commands and events exchanged with the socket thread
//! - [`server`] – the live session protocol and [`server::ServerEvent`]

pub mod chat;
pub mod network;
pub mod server;
