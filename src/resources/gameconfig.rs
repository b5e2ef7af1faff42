//! Overlay configuration resource.
//!
//! Manages overlay settings loaded from an INI configuration file. Provides
//! defaults for safe startup so the overlay always comes up, even in demo
//! mode with no file at all.
//!
//! # Configuration File Format
//!
//! ```ini
//! [server]
//! ws_url = ws://localhost:3001
//! http_base = http://localhost:3001
//! reconnect_delay_ms = 5000
//!
//! [assets]
//! dir = ./assets
//! preload_workers = 4
//!
//! [render]
//! character_size = 128
//! map_size = 196
//! tiles_per_side = 7
//! viewport_radius = 3
//!
//! [window]
//! width = 480
//! height = 320
//! target_fps = 60
//!
//! [persistence]
//! path = ./overlay_state.json
//! interval_secs = 30
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_WS_URL: &str = "ws://localhost:3001";
const DEFAULT_HTTP_BASE: &str = "http://localhost:3001";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
const DEFAULT_PRELOAD_WORKERS: usize = 4;
const DEFAULT_CHARACTER_SIZE: u32 = 128;
const DEFAULT_MAP_SIZE: u32 = 196;
const DEFAULT_TILES_PER_SIDE: u32 = 7;
const DEFAULT_VIEWPORT_RADIUS: u32 = 3;
const DEFAULT_WINDOW_WIDTH: u32 = 480;
const DEFAULT_WINDOW_HEIGHT: u32 = 320;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_PERSIST_INTERVAL_SECS: u64 = 30;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Overlay configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// WebSocket endpoint of the game server.
    pub ws_url: String,
    /// Base URL for the manifest, sprite and viewport HTTP endpoints.
    pub http_base: String,
    /// Fixed delay before a reconnect attempt.
    pub reconnect_delay_ms: u64,
    /// Load assets from this directory instead of over HTTP.
    pub assets_dir: Option<PathBuf>,
    /// Maximum number of concurrent sprite loads during preloading.
    pub preload_workers: usize,
    /// Side of the square character surface in pixels.
    pub character_size: u32,
    /// Side of the square minimap surface in pixels.
    pub map_size: u32,
    /// Grid cells per side on the minimap.
    pub tiles_per_side: u32,
    /// Radius requested from the viewport endpoint.
    pub viewport_radius: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    /// Where to persist the game snapshot; `None` disables persistence.
    pub persistence_path: Option<PathBuf>,
    pub persist_interval_secs: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            http_base: DEFAULT_HTTP_BASE.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            assets_dir: None,
            preload_workers: DEFAULT_PRELOAD_WORKERS,
            character_size: DEFAULT_CHARACTER_SIZE,
            map_size: DEFAULT_MAP_SIZE,
            tiles_per_side: DEFAULT_TILES_PER_SIDE,
            viewport_radius: DEFAULT_VIEWPORT_RADIUS,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            persistence_path: None,
            persist_interval_secs: DEFAULT_PERSIST_INTERVAL_SECS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [server] section
        if let Some(url) = config.get("server", "ws_url") {
            self.ws_url = url;
        }
        if let Some(base) = config.get("server", "http_base") {
            self.http_base = base.trim_end_matches('/').to_string();
        }
        if let Some(delay) = config.getuint("server", "reconnect_delay_ms").ok().flatten() {
            self.reconnect_delay_ms = delay;
        }

        // [assets] section
        if let Some(dir) = config.get("assets", "dir").filter(|d| !d.is_empty()) {
            self.assets_dir = Some(PathBuf::from(dir));
        }
        if let Some(workers) = config.getuint("assets", "preload_workers").ok().flatten() {
            self.preload_workers = (workers as usize).max(1);
        }

        // [render] section
        if let Some(size) = config.getuint("render", "character_size").ok().flatten() {
            self.character_size = size as u32;
        }
        if let Some(size) = config.getuint("render", "map_size").ok().flatten() {
            self.map_size = size as u32;
        }
        if let Some(tiles) = config.getuint("render", "tiles_per_side").ok().flatten() {
            self.tiles_per_side = (tiles as u32).max(1);
        }
        if let Some(radius) = config.getuint("render", "viewport_radius").ok().flatten() {
            self.viewport_radius = radius as u32;
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }

        // [persistence] section
        if let Some(path) = config.get("persistence", "path").filter(|p| !p.is_empty()) {
            self.persistence_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = config.getuint("persistence", "interval_secs").ok().flatten() {
            self.persist_interval_secs = secs.max(1);
        }

        info!(
            "Loaded config: ws={} http={} reconnect={}ms character={}px map={}px grid={} fps={}",
            self.ws_url,
            self.http_base,
            self.reconnect_delay_ms,
            self.character_size,
            self.map_size,
            self.tiles_per_side,
            self.target_fps
        );

        Ok(())
    }

    /// Full URL of an HTTP endpoint below `http_base`.
    pub fn http_url(&self, path: &str) -> String {
        format!("{}/{}", self.http_base, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rpgoverlay_{}_{}.ini",
            name,
            std::process::id()
        ));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_match_overlay_layout() {
        let config = GameConfig::new();
        assert_eq!(config.reconnect_delay_ms, 5000);
        assert_eq!(config.tiles_per_side, 7);
        assert_eq!(config.map_size, 196);
        assert_eq!(config.viewport_radius, 3);
        assert!(config.persistence_path.is_none());
    }

    #[test]
    fn load_overrides_only_present_keys() {
        let path = temp_config(
            "partial",
            "[server]\nws_url = ws://example:9000\nhttp_base = http://example:9000/\n\n[render]\ntiles_per_side = 9\n\n[persistence]\npath = state.json\n",
        );
        let mut config = GameConfig::with_path(&path);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.ws_url, "ws://example:9000");
        assert_eq!(config.http_base, "http://example:9000");
        assert_eq!(config.tiles_per_side, 9);
        assert_eq!(config.map_size, 196);
        assert_eq!(config.persistence_path, Some(PathBuf::from("state.json")));
        assert_eq!(
            config.http_url("/api/assets/manifest"),
            "http://example:9000/api/assets/manifest"
        );
    }

    #[test]
    fn missing_file_is_an_error_and_keeps_defaults() {
        let mut config = GameConfig::with_path("/nonexistent/rpgoverlay/config.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
    }
}
