//! RPG overlay entry point.
//!
//! Client-side presentation layer for a live multiplayer RPG: a layered,
//! animated character sprite plus a tile minimap, fed by a WebSocket game
//! server. Built on:
//! - **bevy_ecs** for the world, the avatar entity and the frame schedule
//! - **tungstenite** / **reqwest** for the live session and the HTTP endpoints
//! - **raylib** (feature `window`) for the on-screen frontend
//!
//! # Main Loop
//!
//! 1. Load `config.ini` and apply command line overrides
//! 2. Preload the asset manifest and every sprite frame (one barrier)
//! 3. Restore persisted state, start the viewport worker and the connection
//! 4. Every frame: advance [`WorldTime`], run the schedule, draw
//! 5. Join the background threads on exit
//!
//! Without the `window` feature the overlay runs headless and only logs;
//! typing `/quit` on stdin stops it. Any other stdin line is
//! fed to the chat feed as user `console`.
//!
//! # Running
//!
//! ```sh
//! cargo run --release --features window -- --server ws://localhost:3001
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use log::{info, warn};

use rpgoverlay::events::chat::ChatMessage;
use rpgoverlay::game::{build_schedule, build_world};
use rpgoverlay::resources::assetcatalog::AssetCatalog;
use rpgoverlay::resources::chat::{ChannelChat, ChatFeed};
use rpgoverlay::resources::connection::{ConnectionManager, WebSocketTransport};
use rpgoverlay::resources::gameconfig::GameConfig;
use rpgoverlay::resources::persistence::{JsonFilePersistence, Persistence};
use rpgoverlay::resources::remote::{DirAssets, HttpApi};
use rpgoverlay::resources::viewport::ViewportClient;
use rpgoverlay::resources::worldtime::WorldTime;
use rpgoverlay::systems::network::shutdown_network;
use rpgoverlay::systems::persistence::restore_game_state;
use rpgoverlay::systems::time::update_world_time;

/// Live RPG overlay client
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// WebSocket URL of the game server.
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Base URL of the game server's HTTP endpoints.
    #[arg(long, value_name = "URL")]
    http: Option<String>,

    /// Read the asset manifest and sprites from a local directory.
    #[arg(long, value_name = "DIR")]
    assets_dir: Option<PathBuf>,

    /// Demo mode: never touch the network.
    #[arg(long)]
    offline: bool,

    /// Persist the game snapshot to this JSON file.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> GameConfig {
    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        info!("{} ({}); using defaults", e, cli.config.display());
    }
    if let Some(url) = &cli.server {
        config.ws_url = url.clone();
    }
    if let Some(base) = &cli.http {
        config.http_base = base.trim_end_matches('/').to_string();
    }
    if let Some(dir) = &cli.assets_dir {
        config.assets_dir = Some(dir.clone());
    }
    if let Some(path) = &cli.save {
        config.persistence_path = Some(path.clone());
    }
    config
}

fn load_assets(config: &GameConfig, http: Option<&HttpApi>) -> AssetCatalog {
    match (&config.assets_dir, http) {
        (Some(dir), _) => AssetCatalog::preload(&DirAssets::new(dir), config.preload_workers),
        (None, Some(http)) => {
            info!("Fetching assets from {}", config.http_url("api/assets/manifest"));
            AssetCatalog::preload(http, config.preload_workers)
        }
        (None, None) => {
            warn!("Asset manifest missing; using rectangles.");
            AssetCatalog::empty()
        }
    }
}

/// Forward stdin lines to the chat feed. The returned receiver fires when a
/// `/quit` line arrives.
fn spawn_console() -> (ChannelChat, Receiver<()>) {
    let (tx_chat, rx_chat) = unbounded();
    let (tx_quit, rx_quit) = unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let line = line.trim();
            if line == "/quit" {
                let _ = tx_quit.send(());
                break;
            }
            if !line.is_empty() && tx_chat.send(ChatMessage::new("console", line)).is_err() {
                break;
            }
        }
    });
    (ChannelChat::new(rx_chat), rx_quit)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);
    info!("RPG overlay starting{}", if cli.offline { " (offline demo)" } else { "" });

    let http = if cli.offline {
        None
    } else {
        match HttpApi::new(&config.http_base) {
            Ok(api) => Some(Arc::new(api)),
            Err(e) => {
                warn!("HTTP client unavailable: {}", e);
                None
            }
        }
    };

    // Nothing connects or renders before every preload settled.
    let catalog = load_assets(&config, http.as_deref());
    info!("{} sprite frames ready", catalog.image_count());

    let mut world = build_world(config.clone(), catalog);

    let persistence = match &config.persistence_path {
        Some(path) => Persistence::new(
            Box::new(JsonFilePersistence::new(path)),
            config.persist_interval_secs as f64,
        ),
        None => Persistence::disabled(),
    };
    world.insert_resource(persistence);
    restore_game_state(&mut world);

    if let Some(http) = http {
        world.insert_resource(ViewportClient::spawn(http));
    }

    if !cli.offline {
        let mut connection = ConnectionManager::new(
            Box::new(WebSocketTransport::spawn(config.ws_url.clone())),
            config.reconnect_delay_ms as f64,
        );
        connection.start();
        world.insert_resource(connection);
    }

    let (chat, rx_quit) = spawn_console();
    world.insert_resource(ChatFeed(Box::new(chat)));

    let mut update = build_schedule();
    run(&mut world, &mut update, &config, &rx_quit);

    shutdown_network(&mut world);
    if let Some(mut client) = world.remove_resource::<ViewportClient>() {
        client.shutdown();
    }
    info!(
        "RPG overlay stopped after {} frames",
        world.resource::<WorldTime>().frame_count
    );
}

#[cfg(feature = "window")]
fn run(
    world: &mut bevy_ecs::world::World,
    update: &mut bevy_ecs::schedule::Schedule,
    config: &GameConfig,
    rx_quit: &Receiver<()>,
) {
    use rpgoverlay::systems::render::RaylibFrontend;

    let mut frontend = RaylibFrontend::open(config);
    while !frontend.should_close() && rx_quit.try_recv().is_err() {
        update_world_time(world, frontend.frame_time());
        update.run(world);
        frontend.draw(world);
        world.clear_trackers();
    }
}

#[cfg(not(feature = "window"))]
fn run(
    world: &mut bevy_ecs::world::World,
    update: &mut bevy_ecs::schedule::Schedule,
    config: &GameConfig,
    rx_quit: &Receiver<()>,
) {
    use std::time::{Duration, Instant};

    let frame = Duration::from_secs_f64(1.0 / f64::from(config.target_fps.max(1)));
    let mut last = Instant::now();
    while rx_quit.try_recv().is_err() {
        let now = Instant::now();
        update_world_time(world, now.duration_since(last).as_secs_f32());
        last = now;
        update.run(world);
        world.clear_trackers();
        if let Some(rest) = frame.checked_sub(now.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}
