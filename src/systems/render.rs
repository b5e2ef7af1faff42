//! raylib frontend.
//!
//! Replays the character and minimap draw lists, then draws the player HUD,
//! the tail of the event log and any floating texts. Sprite textures are
//! uploaded lazily from the encoded bytes kept in the [`AssetCatalog`]; a
//! texture that fails to upload is remembered as missing and never retried.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::warn;
use raylib::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::floatingtext::FloatingText;
use crate::resources::assetcatalog::AssetCatalog;
use crate::resources::eventlog::EventLog;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestatestore::GameStateStore;
use crate::resources::surface::{CharacterSurface, DrawCmd, MapSurface, Rgba};

const MARGIN: f32 = 8.0;
const TEXT_SIZE: i32 = 10;
const LOG_LINES: usize = 6;

fn color(c: Rgba) -> Color {
    Color::new(c.r, c.g, c.b, c.a)
}

pub struct RaylibFrontend {
    rl: RaylibHandle,
    thread: RaylibThread,
    textures: FxHashMap<Arc<str>, Option<Texture2D>>,
}

impl RaylibFrontend {
    pub fn open(config: &GameConfig) -> Self {
        let (mut rl, thread) = raylib::init()
            .size(config.window_width as i32, config.window_height as i32)
            .title("RPG Overlay")
            .build();
        rl.set_target_fps(config.target_fps);
        rl.set_exit_key(None);
        RaylibFrontend {
            rl,
            thread,
            textures: FxHashMap::default(),
        }
    }

    pub fn should_close(&self) -> bool {
        self.rl.window_should_close()
    }

    /// Seconds the last frame took.
    pub fn frame_time(&self) -> f32 {
        self.rl.get_frame_time()
    }

    fn upload_missing(&mut self, catalog: &AssetCatalog, commands: &[DrawCmd]) {
        for cmd in commands {
            let DrawCmd::Sprite { path, .. } = cmd else {
                continue;
            };
            if self.textures.contains_key(path) {
                continue;
            }
            let texture = catalog.image(path).and_then(|image| {
                let ext = path.rsplit('.').next().unwrap_or("png");
                let decoded = Image::load_image_from_mem(&format!(".{}", ext), &image.encoded)
                    .map_err(|e| warn!("[render] cannot decode '{}': {}", path, e))
                    .ok()?;
                self.rl
                    .load_texture_from_image(&self.thread, &decoded)
                    .map_err(|e| warn!("[render] cannot upload '{}': {}", path, e))
                    .ok()
            });
            self.textures.insert(path.clone(), texture);
        }
    }

    pub fn draw(&mut self, world: &mut World) {
        let character = world.resource::<CharacterSurface>().commands.clone();
        self.upload_missing(world.resource::<AssetCatalog>(), &character);

        let config = world.resource::<GameConfig>().clone();
        let map = world.resource::<MapSurface>();
        let map_origin = (
            config.window_width as f32 - map.size as f32 - MARGIN,
            MARGIN,
        );
        let map_commands = map.commands.clone();

        let player = world.resource::<GameStateStore>().current_player().cloned();
        let log_lines: Vec<String> = {
            let log = world.resource::<EventLog>();
            let skip = log.len().saturating_sub(LOG_LINES);
            log.entries().skip(skip).map(|e| e.formatted()).collect()
        };
        let floating: Vec<FloatingText> = world
            .query::<&FloatingText>()
            .iter(world)
            .cloned()
            .collect();

        let textures = &self.textures;
        let mut d = self.rl.begin_drawing(&self.thread);
        d.clear_background(Color::BLACK);

        replay(&mut d, textures, &character, (MARGIN, MARGIN));
        replay(&mut d, textures, &map_commands, map_origin);

        let hud_y = MARGIN as i32 * 2 + config.character_size as i32;
        match &player {
            Some(player) => {
                for (i, line) in player.summary_lines().iter().enumerate() {
                    let y = hud_y + i as i32 * 12;
                    d.draw_text(line, MARGIN as i32, y, TEXT_SIZE, Color::WHITE);
                }
                let bar_y = hud_y + 50;
                let bar_w = config.character_size as f32;
                let bars = [
                    (player.hp_fraction(), Color::RED),
                    (player.xp_fraction(), Color::GOLD),
                ];
                for (i, (fill, tint)) in bars.into_iter().enumerate() {
                    let y = (bar_y + i as i32 * 8) as f32;
                    d.draw_rectangle_rec(Rectangle::new(MARGIN, y, bar_w, 5.0), Color::DARKGRAY);
                    d.draw_rectangle_rec(Rectangle::new(MARGIN, y, bar_w * fill, 5.0), tint);
                }
            }
            None => d.draw_text(
                "Waiting for game...",
                MARGIN as i32,
                hud_y,
                TEXT_SIZE,
                Color::GRAY,
            ),
        }

        let log_top = config.window_height as i32 - LOG_LINES as i32 * 12 - MARGIN as i32;
        for (i, line) in log_lines.iter().enumerate() {
            let y = log_top + i as i32 * 12;
            d.draw_text(line, MARGIN as i32, y, TEXT_SIZE, Color::LIGHTGRAY);
        }

        for text in &floating {
            let (size, tint) = if text.critical {
                (24, Color::GOLD)
            } else {
                (18, Color::WHITE)
            };
            d.draw_text(&text.text, text.x as i32, text.y as i32, size, tint);
        }
    }
}

fn replay(
    d: &mut RaylibDrawHandle,
    textures: &FxHashMap<Arc<str>, Option<Texture2D>>,
    commands: &[DrawCmd],
    (ox, oy): (f32, f32),
) {
    for cmd in commands {
        match cmd {
            DrawCmd::Clear => {}
            DrawCmd::FillRect { rect, color: c } => {
                let dest = Rectangle::new(ox + rect.x, oy + rect.y, rect.w, rect.h);
                d.draw_rectangle_rec(dest, color(*c));
            }
            DrawCmd::StrokeRect { rect, color: c } => {
                d.draw_rectangle_lines_ex(
                    Rectangle::new(ox + rect.x, oy + rect.y, rect.w, rect.h),
                    1.0,
                    color(*c),
                );
            }
            DrawCmd::Line { from, to, color: c } => {
                d.draw_line_v(
                    Vector2::new(ox + from.0, oy + from.1),
                    Vector2::new(ox + to.0, oy + to.1),
                    color(*c),
                );
            }
            DrawCmd::Sprite { path, dest } => {
                if let Some(Some(texture)) = textures.get(path) {
                    let src = Rectangle::new(0.0, 0.0, texture.width as f32, texture.height as f32);
                    let dest = Rectangle::new(ox + dest.x, oy + dest.y, dest.w, dest.h);
                    d.draw_texture_pro(texture, src, dest, Vector2::zero(), 0.0, Color::WHITE);
                }
            }
        }
    }
}
