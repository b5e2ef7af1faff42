//! ECS resources and the services behind them.
//!
//! Submodules overview:
//! - [`assetcatalog`] – asset manifest plus decoded sprite frames
//! - [`chat`] – chat feed capability
//! - [`connection`] – session lifecycle and reconnect policy
//! - [`eventlog`] – user-facing event log
//! - [`gameconfig`] – INI-backed configuration
//! - [`gamestatestore`] – latest world snapshot and current player
//! - [`persistence`] – optional snapshot persistence
//! - [`remote`] – HTTP and directory sources for assets and viewports
//! - [`surface`] – backend-neutral draw lists
//! - [`viewport`] – viewport data and the query worker
//! - [`worldtime`] – the overlay clock

pub mod assetcatalog;
pub mod chat;
pub mod connection;
pub mod eventlog;
pub mod gameconfig;
pub mod gamestatestore;
pub mod persistence;
pub mod remote;
pub mod surface;
pub mod viewport;
pub mod worldtime;
