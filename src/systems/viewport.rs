//! Minimap rendering and viewport queries.
//!
//! [`render_viewport`] draws a server viewport as a grid of cells;
//! [`render_minimap_fallback`] draws the static grid used until the first
//! viewport arrives. Both are pure and always redraw the whole surface.
//!
//! [`request_viewport`] and [`poll_viewport_replies`] connect the
//! [`GameStateStore`] to the viewport worker: a request goes out when the
//! current player's coordinate changes, and replies are drawn on a later tick.

use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::eventlog::EventLog;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestatestore::{GameStateStore, Player};
use crate::resources::surface::{DrawCmd, MapContent, MapSurface, Rect, Rgba};
use crate::resources::viewport::{Viewport, ViewportClient, ViewportReply, ViewportState};
use crate::resources::worldtime::WorldTime;

pub const BACKGROUND: Rgba = Rgba::hex(0x1a1a1a);
pub const CELL_BORDER: Rgba = Rgba::hex(0x333333);
pub const BLOCKED_FILL: Rgba = Rgba::hex(0x444444);
pub const SELF_MARKER: Rgba = Rgba::hex(0x3498db);
/// Grid pitch and dot size of the fallback minimap.
pub const FALLBACK_PITCH: f32 = 20.0;
pub const FALLBACK_DOT: f32 = 4.0;

/// Draw `viewport` onto a `size` px square divided into `tiles_per_side` cells.
///
/// Tiles are placed in iteration order, so a viewport wider than the grid
/// wraps and one that is narrower leaves cells blank.
pub fn render_viewport(viewport: &Viewport, size: u32, tiles_per_side: u32) -> Vec<DrawCmd> {
    let per_side = tiles_per_side.max(1);
    let cell = (size / per_side) as f32;
    let extent = size as f32;
    let radius = i64::from(viewport.radius);
    let (cx, cy) = (i64::from(viewport.center.x), i64::from(viewport.center.y));
    let per_side = per_side as usize;

    let mut commands = vec![DrawCmd::FillRect {
        rect: Rect::new(0.0, 0.0, extent, extent),
        color: BACKGROUND,
    }];

    let mut i: usize = 0;
    for y in cy - radius..=cy + radius {
        for x in cx - radius..=cx + radius {
            let tile = viewport.tiles.get(i).copied().unwrap_or_default();
            let px = (i % per_side) as f32 * cell;
            let py = (i / per_side) as f32 * cell;
            i += 1;

            commands.push(DrawCmd::StrokeRect {
                rect: Rect::new(px, py, cell, cell),
                color: CELL_BORDER,
            });
            if tile.blocked {
                commands.push(DrawCmd::FillRect {
                    rect: Rect::new(px + 1.0, py + 1.0, cell - 2.0, cell - 2.0),
                    color: BLOCKED_FILL,
                });
            }
            if x == cx && y == cy {
                let side = (cell * 0.35).floor();
                let offset = (cell - side) / 2.0;
                commands.push(DrawCmd::FillRect {
                    rect: Rect::new(px + offset, py + offset, side, side),
                    color: SELF_MARKER,
                });
            }
        }
    }
    commands
}

/// Static grid with the player's dot, used before any viewport arrived.
pub fn render_minimap_fallback(player: Option<&Player>, size: u32) -> Vec<DrawCmd> {
    let extent = size as f32;
    let mut commands = vec![DrawCmd::FillRect {
        rect: Rect::new(0.0, 0.0, extent, extent),
        color: BACKGROUND,
    }];

    let mut at = 0.0;
    while at <= extent {
        commands.push(DrawCmd::Line {
            from: (at, 0.0),
            to: (at, extent),
            color: CELL_BORDER,
        });
        commands.push(DrawCmd::Line {
            from: (0.0, at),
            to: (extent, at),
            color: CELL_BORDER,
        });
        at += FALLBACK_PITCH;
    }

    if let Some(player) = player {
        commands.push(DrawCmd::FillRect {
            rect: Rect::new(
                player.x as f32 * FALLBACK_PITCH + 8.0,
                player.y as f32 * FALLBACK_PITCH + 8.0,
                FALLBACK_DOT,
                FALLBACK_DOT,
            ),
            color: SELF_MARKER,
        });
    }
    commands
}

/// React to a player change: redraw the fallback while no viewport was ever
/// received, and ask for a viewport when the coordinate changed.
pub fn request_viewport(
    store: Res<GameStateStore>,
    mut state: ResMut<ViewportState>,
    mut map: ResMut<MapSurface>,
    client: Option<Res<ViewportClient>>,
    config: Res<GameConfig>,
) {
    if store.revision() == state.seen_revision {
        return;
    }
    state.seen_revision = store.revision();
    let Some(player) = store.current_player() else {
        return;
    };

    if !state.has_received() {
        let size = map.size;
        map.replace(
            MapContent::Fallback,
            render_minimap_fallback(Some(player), size),
        );
    }

    let position = player.position();
    if state.last_requested == Some(position) {
        return;
    }
    state.last_requested = Some(position);
    if let Some(client) = client {
        debug!("[viewport] requesting ({}, {})", position.x, position.y);
        client.request(position, config.viewport_radius);
    }
}

/// Draw viewports that arrived; log failures and keep the last drawing.
pub fn poll_viewport_replies(
    client: Option<Res<ViewportClient>>,
    mut state: ResMut<ViewportState>,
    mut map: ResMut<MapSurface>,
    mut log: ResMut<EventLog>,
    config: Res<GameConfig>,
    time: Res<WorldTime>,
) {
    let Some(client) = client else {
        return;
    };
    for reply in client.rx_reply.try_iter() {
        match reply {
            ViewportReply::Loaded(viewport) => match viewport.validate() {
                Ok(()) => {
                    let size = map.size;
                    map.replace(
                        MapContent::Viewport,
                        render_viewport(&viewport, size, config.tiles_per_side),
                    );
                    state.last = Some(viewport);
                }
                Err(e) => {
                    debug!("[viewport] rejected: {}", e);
                    log.push(time.elapsed, "Viewport fetch failed (demo mode).");
                }
            },
            ViewportReply::Failed { center, error } => {
                debug!(
                    "[viewport] fetch ({}, {}) failed: {}",
                    center.x, center.y, error
                );
                log.push(time.elapsed, "Viewport fetch failed (demo mode).");
            }
        }
    }
}
