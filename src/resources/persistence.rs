//! Optional snapshot persistence.
//!
//! The overlay offers its latest [`GameSnapshot`] to a provider on a fixed
//! cadence and asks for one once at startup. Where the snapshot ends up is
//! the provider's business; without one configured, [`NoPersistence`]
//! swallows everything.

use std::path::PathBuf;

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::resources::gamestatestore::GameSnapshot;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub trait PersistenceProvider: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;
    /// Previously stored snapshot, if any.
    fn load(&self) -> Result<Option<GameSnapshot>, PersistenceError>;
    fn save(&self, snapshot: &GameSnapshot) -> Result<(), PersistenceError>;
}

/// Provider used when no store is configured.
pub struct NoPersistence;

impl PersistenceProvider for NoPersistence {
    fn name(&self) -> &str {
        "nowhere"
    }

    fn load(&self) -> Result<Option<GameSnapshot>, PersistenceError> {
        Ok(None)
    }

    fn save(&self, _snapshot: &GameSnapshot) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Stores the snapshot as a JSON document on disk.
pub struct JsonFilePersistence {
    path: PathBuf,
    name: String,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        JsonFilePersistence { path, name }
    }
}

impl PersistenceProvider for JsonFilePersistence {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<GameSnapshot>, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &GameSnapshot) -> Result<(), PersistenceError> {
        let body = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The active provider plus the save cadence.
#[derive(Resource)]
pub struct Persistence {
    pub provider: Box<dyn PersistenceProvider>,
    pub interval_secs: f64,
    pub next_save_at: f64,
}

impl Persistence {
    pub fn new(provider: Box<dyn PersistenceProvider>, interval_secs: f64) -> Self {
        Persistence {
            provider,
            interval_secs,
            next_save_at: interval_secs,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Box::new(NoPersistence), 30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_nothing() {
        let store = JsonFilePersistence::new("/nonexistent/rpgoverlay/state.json");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_snapshot_is_restored() {
        let path = std::env::temp_dir()
            .join(format!("rpgoverlay_state_{}.json", std::process::id()));
        let store = JsonFilePersistence::new(&path);
        let snapshot: GameSnapshot =
            serde_json::from_str(r#"{"players":[{"id":1,"username":"A","x":2,"y":3}],"turn":4}"#)
                .unwrap();
        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("rpgoverlay_corrupt_{}.json", std::process::id()));
        std::fs::write(&path, "{{{").unwrap();
        let result = JsonFilePersistence::new(&path).load();
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PersistenceError::Encoding(_))));
    }
}
