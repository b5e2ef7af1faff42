//! Overlay assembly.
//!
//! [`build_world`] inserts every resource the systems expect and spawns the
//! avatar; [`build_schedule`] returns the per-frame pipeline. Optional
//! collaborators (connection, viewport client, chat, persistence) are
//! inserted by the caller afterwards; every system tolerates their absence.

use bevy_ecs::prelude::*;

use crate::components::animation::{AnimationController, IdleFlavorScheduler};
use crate::components::avatar::Avatar;
use crate::components::loadout::Loadout;
use crate::events::server::ServerEvent;
use crate::resources::assetcatalog::AssetCatalog;
use crate::resources::chat::ChatFeed;
use crate::resources::eventlog::EventLog;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestatestore::GameStateStore;
use crate::resources::surface::{CharacterSurface, MapContent, MapSurface};
use crate::resources::viewport::ViewportState;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{animation_system, idle_flavor_system};
use crate::systems::chat::poll_chat;
use crate::systems::compositor::compose_character_system;
use crate::systems::network::{apply_server_events, poll_connection, update_server_event_messages};
use crate::systems::persistence::persist_game_state;
use crate::systems::ttl::ttl_system;
use crate::systems::viewport::{poll_viewport_replies, render_minimap_fallback, request_viewport};

/// Create the world with its core resources and the avatar entity.
pub fn build_world(config: GameConfig, catalog: AssetCatalog) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(EventLog::new());
    world.insert_resource(GameStateStore::new());
    world.insert_resource(ViewportState::default());
    world.insert_resource(ChatFeed::default());
    world.insert_resource(Messages::<ServerEvent>::default());
    world.insert_resource(CharacterSurface::new(
        config.character_size,
        config.character_size,
    ));

    let mut map = MapSurface::new(config.map_size);
    map.replace(
        MapContent::Fallback,
        render_minimap_fallback(None, config.map_size),
    );
    world.insert_resource(map);

    world.spawn((
        Avatar,
        AnimationController::from_manifest(catalog.manifest()),
        IdleFlavorScheduler::new(0.0),
        Loadout::from_manifest(catalog.manifest()),
    ));

    world.insert_resource(catalog);
    world.insert_resource(config);
    world
}

/// The per-frame pipeline, in order:
/// network intake, state update, viewport, animation, TTL, compositing, persistence.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            update_server_event_messages,
            poll_connection,
            poll_chat,
            apply_server_events,
            request_viewport,
            poll_viewport_replies,
            animation_system,
            idle_flavor_system,
            ttl_system,
            compose_character_system,
            persist_game_state,
        )
            .chain(),
    );
    update
}
