//! Snapshot persistence systems.
//!
//! [`restore_game_state`] runs once before the first frame;
//! [`persist_game_state`] offers the latest snapshot to the provider every
//! `interval_secs` of overlay time. Provider errors are logged and never
//! interrupt the frame loop.

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::resources::eventlog::EventLog;
use crate::resources::gamestatestore::GameStateStore;
use crate::resources::persistence::Persistence;
use crate::resources::worldtime::WorldTime;

/// Load a stored snapshot into the [`GameStateStore`], if the provider has one.
pub fn restore_game_state(world: &mut World) {
    let loaded = {
        let Some(persistence) = world.get_resource::<Persistence>() else {
            return;
        };
        let name = persistence.provider.name().to_string();
        match persistence.provider.load() {
            Ok(Some(snapshot)) => Some((name, snapshot)),
            Ok(None) => {
                debug!("[persist] nothing stored in {}", name);
                None
            }
            Err(e) => {
                warn!("[persist] could not load from {}: {}", name, e);
                None
            }
        }
    };

    if let Some((name, snapshot)) = loaded {
        world.resource_mut::<GameStateStore>().restore(snapshot);
        let now = world.resource::<WorldTime>().elapsed;
        world
            .resource_mut::<EventLog>()
            .push(now, format!("Loaded game state from {}", name));
    }
}

/// Save the current snapshot when the interval elapsed.
pub fn persist_game_state(
    persistence: Option<ResMut<Persistence>>,
    store: Res<GameStateStore>,
    time: Res<WorldTime>,
) {
    let Some(mut persistence) = persistence else {
        return;
    };
    if time.elapsed < persistence.next_save_at {
        return;
    }
    let interval = persistence.interval_secs.max(1.0);
    while persistence.next_save_at <= time.elapsed {
        persistence.next_save_at += interval;
    }

    let Some(snapshot) = store.snapshot() else {
        return;
    };
    match persistence.provider.save(snapshot) {
        Ok(()) => info!("[persist] snapshot saved to {}", persistence.provider.name()),
        Err(e) => warn!(
            "[persist] saving to {} failed: {}",
            persistence.provider.name(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::gamestatestore::GameSnapshot;
    use crate::resources::persistence::{PersistenceError, PersistenceProvider};
    use crate::systems::time::update_world_time;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStore {
        saved: Arc<Mutex<Vec<GameSnapshot>>>,
        stored: Option<GameSnapshot>,
    }

    impl PersistenceProvider for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }
        fn load(&self) -> Result<Option<GameSnapshot>, PersistenceError> {
            Ok(self.stored.clone())
        }
        fn save(&self, snapshot: &GameSnapshot) -> Result<(), PersistenceError> {
            self.saved.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn world(provider: MemoryStore) -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(EventLog::new());
        world.insert_resource(GameStateStore::new());
        world.insert_resource(Persistence::new(Box::new(provider), 30.0));
        world
    }

    #[test]
    fn saves_every_interval_once_a_snapshot_exists() {
        let provider = MemoryStore::default();
        let mut world = world(provider.clone());
        let mut schedule = Schedule::default();
        schedule.add_systems(persist_game_state);

        // First interval passes with nothing to save.
        update_world_time(&mut world, 30.0);
        schedule.run(&mut world);
        assert!(provider.saved.lock().unwrap().is_empty());

        world
            .resource_mut::<GameStateStore>()
            .replace_snapshot(Arc::new(GameSnapshot::default()));
        update_world_time(&mut world, 10.0);
        schedule.run(&mut world);
        assert!(provider.saved.lock().unwrap().is_empty());

        update_world_time(&mut world, 20.0);
        schedule.run(&mut world);
        update_world_time(&mut world, 1.0);
        schedule.run(&mut world);
        assert_eq!(provider.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn restore_logs_the_provider() {
        let stored: GameSnapshot =
            serde_json::from_str(r#"{"players":[{"id":"a","username":"A","x":1,"y":1}]}"#)
                .unwrap();
        let provider = MemoryStore {
            stored: Some(stored.clone()),
            ..Default::default()
        };
        let mut world = world(provider);
        restore_game_state(&mut world);

        assert_eq!(
            world.resource::<GameStateStore>().snapshot().map(|s| &**s),
            Some(&stored)
        );
        assert_eq!(
            world
                .resource::<EventLog>()
                .count_containing("Loaded game state from memory"),
            1
        );
    }

    #[test]
    fn restore_without_stored_state_is_quiet() {
        let mut world = world(MemoryStore::default());
        restore_game_state(&mut world);
        assert!(world.resource::<GameStateStore>().snapshot().is_none());
        assert!(world.resource::<EventLog>().is_empty());
    }

    #[test]
    fn disabled_persistence_restores_and_saves_nothing() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(EventLog::new());
        world.insert_resource(GameStateStore::new());
        world.insert_resource(Persistence::disabled());
        restore_game_state(&mut world);
        assert!(world.resource::<GameStateStore>().snapshot().is_none());

        world
            .resource_mut::<GameStateStore>()
            .replace_snapshot(Arc::new(GameSnapshot::default()));
        let mut schedule = Schedule::default();
        schedule.add_systems(persist_game_state);
        update_world_time(&mut world, 31.0);
        schedule.run(&mut world);

        assert!(world.resource::<EventLog>().is_empty());
        assert!(world.resource::<Persistence>().next_save_at > 31.0);
    }
}
