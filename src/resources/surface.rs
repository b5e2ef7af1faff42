//! Backend-neutral drawing surfaces.
//!
//! The compositor and the viewport renderer never talk to a graphics API.
//! They fill a [`DrawList`] on one of the surface resources and a frontend
//! (see `crate::systems::render`) replays it every frame. This keeps the
//! render step a pure function of state that tests can inspect directly.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use smallvec::SmallVec;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Rgba {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a: 0xff,
        }
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// A single drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Reset the surface to transparent.
    Clear,
    FillRect { rect: Rect, color: Rgba },
    StrokeRect { rect: Rect, color: Rgba },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgba,
    },
    /// Draw the image loaded for `path` scaled into `dest`.
    Sprite { path: Arc<str>, dest: Rect },
}

impl DrawCmd {
    /// Whether the command puts visible pixels on the surface.
    pub fn is_visible(&self) -> bool {
        !matches!(self, DrawCmd::Clear)
    }
}

/// Ordered draw commands for one surface.
pub type DrawList = SmallVec<[DrawCmd; 8]>;

/// The square surface the layered character sprite is composited into.
#[derive(Resource, Debug, Clone)]
pub struct CharacterSurface {
    pub width: u32,
    pub height: u32,
    pub commands: DrawList,
}

impl CharacterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        CharacterSurface {
            width,
            height,
            commands: DrawList::new(),
        }
    }
}

/// What the minimap currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapContent {
    /// Nothing drawn yet.
    #[default]
    Blank,
    /// The static grid with the last known player dot.
    Fallback,
    /// A viewport received from the server.
    Viewport,
}

/// The square minimap surface.
///
/// Unlike the character surface it is not redrawn every tick: it keeps its
/// commands until the viewport systems replace them.
#[derive(Resource, Debug, Clone)]
pub struct MapSurface {
    pub size: u32,
    pub content: MapContent,
    pub commands: Vec<DrawCmd>,
}

impl MapSurface {
    pub fn new(size: u32) -> Self {
        MapSurface {
            size,
            content: MapContent::Blank,
            commands: Vec::new(),
        }
    }

    pub fn replace(&mut self, content: MapContent, commands: Vec<DrawCmd>) {
        self.content = content;
        self.commands = commands;
    }
}
