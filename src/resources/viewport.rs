//! Viewport data and the background query worker.
//!
//! A [`Viewport`] is a square window of world tiles around a center
//! coordinate. The overlay asks the server for one whenever the current
//! player moves; requests run on a worker thread (same bridge shape as the
//! network worker) so a slow HTTP round-trip never stalls the frame loop.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::resources::remote::ViewportSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    #[serde(default)]
    pub blocked: bool,
}

/// Row-major window of tiles covering `[center - radius, center + radius]`
/// on both axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coord,
    pub radius: u32,
    #[serde(default)]
    pub tiles: Vec<Tile>,
}

impl Viewport {
    /// Number of tiles a viewport of `radius` must carry, or `None` when
    /// that count does not fit in `usize`.
    pub fn expected_len(radius: u32) -> Option<usize> {
        let side = usize::try_from(radius)
            .ok()?
            .checked_mul(2)?
            .checked_add(1)?;
        side.checked_mul(side)
    }

    /// Check the length invariant.
    pub fn validate(&self) -> Result<(), String> {
        let Some(expected) = Self::expected_len(self.radius) else {
            return Err(format!("viewport radius {} is too large", self.radius));
        };
        if self.tiles.len() == expected {
            Ok(())
        } else {
            Err(format!(
                "viewport radius {} needs {} tiles, got {}",
                self.radius,
                expected,
                self.tiles.len()
            ))
        }
    }
}

/// Request sent to the viewport worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportCmd {
    Fetch { center: Coord, radius: u32 },
    Shutdown,
}

/// Reply sent back from the viewport worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportReply {
    Loaded(Viewport),
    Failed { center: Coord, error: String },
}

/// Viewport bookkeeping shared by the viewport systems.
#[derive(Resource, Debug, Clone, Default)]
pub struct ViewportState {
    /// Last viewport that rendered successfully.
    pub last: Option<Viewport>,
    /// Coordinate of the last request sent, used to skip duplicates.
    pub last_requested: Option<Coord>,
    /// Store revision the viewport systems last reacted to.
    pub seen_revision: u64,
}

impl ViewportState {
    pub fn has_received(&self) -> bool {
        self.last.is_some()
    }
}

/// Bridge between the ECS world and the viewport worker thread.
#[derive(Resource)]
pub struct ViewportClient {
    pub tx_cmd: Sender<ViewportCmd>,
    pub rx_reply: Receiver<ViewportReply>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ViewportClient {
    /// Spawn the worker thread around a viewport source.
    pub fn spawn(source: Arc<dyn ViewportSource>) -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<ViewportCmd>();
        let (tx_reply, rx_reply) = unbounded::<ViewportReply>();
        let handle = std::thread::spawn(move || viewport_worker(source, rx_cmd, tx_reply));
        ViewportClient {
            tx_cmd,
            rx_reply,
            handle: Some(handle),
        }
    }

    /// Wrap existing channels; the caller plays the worker.
    pub fn from_channels(tx_cmd: Sender<ViewportCmd>, rx_reply: Receiver<ViewportReply>) -> Self {
        ViewportClient {
            tx_cmd,
            rx_reply,
            handle: None,
        }
    }

    pub fn request(&self, center: Coord, radius: u32) {
        if self.tx_cmd.send(ViewportCmd::Fetch { center, radius }).is_err() {
            warn!("[viewport] worker is gone; request dropped");
        }
    }

    /// Stop the worker and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.tx_cmd.send(ViewportCmd::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Worker loop: serve fetch requests until shutdown or until the client is gone.
///
/// Only the newest queued request is served; older ones are stale by the time
/// the worker gets to them.
fn viewport_worker(
    source: Arc<dyn ViewportSource>,
    rx_cmd: Receiver<ViewportCmd>,
    tx_reply: Sender<ViewportReply>,
) {
    while let Ok(first) = rx_cmd.recv() {
        let mut cmd = first;
        for next in rx_cmd.try_iter() {
            if cmd == ViewportCmd::Shutdown {
                break;
            }
            cmd = next;
        }
        let (center, radius) = match cmd {
            ViewportCmd::Shutdown => break,
            ViewportCmd::Fetch { center, radius } => (center, radius),
        };
        debug!("[viewport] fetch ({}, {}) r={}", center.x, center.y, radius);
        let reply = match source.viewport(center.x, center.y, radius) {
            Ok(viewport) => ViewportReply::Loaded(viewport),
            Err(e) => ViewportReply::Failed {
                center,
                error: e.to_string(),
            },
        };
        if tx_reply.send(reply).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::remote::FetchError;

    struct GridSource;

    impl ViewportSource for GridSource {
        fn viewport(&self, x: i32, y: i32, radius: u32) -> Result<Viewport, FetchError> {
            if x < 0 {
                return Err(FetchError::Rejected("out of world".into()));
            }
            Ok(Viewport {
                center: Coord { x, y },
                radius,
                tiles: vec![Tile::default(); Viewport::expected_len(radius).unwrap_or(0)],
            })
        }
    }

    #[test]
    fn length_invariant() {
        assert_eq!(Viewport::expected_len(0), Some(1));
        assert_eq!(Viewport::expected_len(3), Some(49));
        let short = Viewport {
            center: Coord { x: 0, y: 0 },
            radius: 1,
            tiles: vec![Tile::default(); 8],
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn oversized_radius_is_rejected_not_a_panic() {
        let json = r#"{"center":{"x":0,"y":0},"radius":4294967295,"tiles":[]}"#;
        let vp: Viewport = serde_json::from_str(json).unwrap();
        assert!(vp.validate().is_err());
        assert_eq!(Viewport::expected_len(u32::MAX), None);
    }

    #[test]
    fn parses_server_json() {
        let json = r#"{"center":{"x":4,"y":5},"radius":0,"tiles":[{"blocked":true}]}"#;
        let vp: Viewport = serde_json::from_str(json).unwrap();
        assert_eq!(vp.center, Coord { x: 4, y: 5 });
        assert!(vp.tiles[0].blocked);
        assert!(vp.validate().is_ok());
    }

    #[test]
    fn worker_replies_and_reports_failures() {
        let mut client = ViewportClient::spawn(Arc::new(GridSource));
        client.request(Coord { x: 2, y: 3 }, 1);
        match client.rx_reply.recv().unwrap() {
            ViewportReply::Loaded(vp) => {
                assert_eq!(vp.center, Coord { x: 2, y: 3 });
                assert_eq!(vp.tiles.len(), 9);
            }
            other => panic!("unexpected reply {:?}", other),
        }
        client.request(Coord { x: -1, y: 0 }, 1);
        assert!(matches!(
            client.rx_reply.recv().unwrap(),
            ViewportReply::Failed { .. }
        ));
        client.shutdown();
    }
}
