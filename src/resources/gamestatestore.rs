//! Latest known world snapshot and current player.
//!
//! Both values live behind `Arc` and are only ever swapped wholesale, so any
//! reader sees a complete snapshot: either the previous one or the new one,
//! never a mix of fields from two network messages.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::resources::viewport::Coord;

/// Player identifiers arrive as numbers from some servers and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::Number(n) => write!(f, "{}", n),
            PlayerId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default, rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub hp: i64,
    #[serde(default, rename = "maxHP", alias = "maxHp")]
    pub max_hp: i64,
    #[serde(default)]
    pub attack: i64,
    #[serde(default)]
    pub defense: i64,
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub experience: i64,
    pub x: i32,
    pub y: i32,
}

impl Player {
    pub fn position(&self) -> Coord {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Health bar fill in `[0, 1]`.
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }

    /// Experience bar fill in `[0, 1]`, assuming 100 XP per level.
    pub fn xp_fraction(&self) -> f32 {
        self.experience.rem_euclid(100) as f32 / 100.0
    }

    /// Stat lines shown next to the character.
    pub fn summary_lines(&self) -> [String; 4] {
        [
            self.username.clone(),
            format!("Lvl {} {}", self.level, self.class_name),
            format!(
                "HP: {}/{}  ATK: {} DEF: {}",
                self.hp, self.max_hp, self.attack, self.defense
            ),
            format!("Gold: {}", self.gold),
        ]
    }
}

/// Full world snapshot as broadcast by the server.
///
/// Only `players` is interpreted; every other field is carried along untouched
/// so persisting and restoring a snapshot does not lose data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GameSnapshot {
    /// The most recently active player, which the server lists last.
    pub fn latest_player(&self) -> Option<&Player> {
        self.players.last()
    }
}

/// Authoritative client-side view of the game.
#[derive(Resource, Debug, Clone, Default)]
pub struct GameStateStore {
    snapshot: Option<Arc<GameSnapshot>>,
    current_player: Option<Arc<Player>>,
    revision: u64,
}

impl GameStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&Arc<GameSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn current_player(&self) -> Option<&Arc<Player>> {
        self.current_player.as_ref()
    }

    /// Bumped whenever the current player changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole snapshot; the current player becomes its last entry
    /// if there is one, otherwise it is left as it was.
    pub fn replace_snapshot(&mut self, snapshot: Arc<GameSnapshot>) {
        if let Some(player) = snapshot.latest_player() {
            self.set_player(Arc::new(player.clone()));
        }
        self.snapshot = Some(snapshot);
    }

    /// Replace the current player.
    pub fn set_player(&mut self, player: Arc<Player>) {
        self.current_player = Some(player);
        self.revision += 1;
    }

    /// Install a snapshot restored from persistence without touching the
    /// current player.
    pub fn restore(&mut self, snapshot: GameSnapshot) {
        self.snapshot = Some(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, x: i32, y: i32) -> Player {
        Player {
            id: PlayerId::Text(name.to_string()),
            username: name.to_string(),
            level: 2,
            class_name: "mage".to_string(),
            hp: 5,
            max_hp: 20,
            attack: 3,
            defense: 1,
            gold: 7,
            experience: 250,
            x,
            y,
        }
    }

    #[test]
    fn parses_wire_field_names() {
        let json = r#"{"id":7,"username":"A","level":3,"class":"rogue","hp":9,"maxHP":12,
            "attack":4,"defense":2,"gold":1,"experience":42,"x":1,"y":-2}"#;
        let p: Player = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, PlayerId::Number(7));
        assert_eq!(p.class_name, "rogue");
        assert_eq!(p.max_hp, 12);
        assert_eq!(p.position(), Coord { x: 1, y: -2 });

        let alias = r#"{"id":"p1","username":"B","maxHp":3,"x":0,"y":0}"#;
        let p: Player = serde_json::from_str(alias).unwrap();
        assert_eq!(p.max_hp, 3);
        assert_eq!(p.id.to_string(), "p1");
    }

    #[test]
    fn player_without_position_is_rejected() {
        assert!(serde_json::from_str::<Player>(r#"{"id":1,"username":"A"}"#).is_err());
    }

    #[test]
    fn snapshot_replace_takes_last_player() {
        let mut store = GameStateStore::new();
        let snapshot = GameSnapshot {
            players: vec![player("a", 0, 0), player("b", 3, 4)],
            extra: Default::default(),
        };
        store.replace_snapshot(Arc::new(snapshot));
        assert_eq!(store.current_player().unwrap().username, "b");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn empty_snapshot_keeps_current_player() {
        let mut store = GameStateStore::new();
        store.set_player(Arc::new(player("a", 1, 1)));
        store.replace_snapshot(Arc::new(GameSnapshot::default()));
        assert_eq!(store.current_player().unwrap().username, "a");
        assert_eq!(store.revision(), 1);
        assert!(store.snapshot().unwrap().players.is_empty());
    }

    #[test]
    fn readers_keep_their_snapshot_across_replacement() {
        let mut store = GameStateStore::new();
        store.set_player(Arc::new(player("a", 1, 1)));
        let held = Arc::clone(store.current_player().unwrap());
        store.set_player(Arc::new(player("a", 9, 9)));
        assert_eq!(held.position(), Coord { x: 1, y: 1 });
        assert_eq!(store.current_player().unwrap().position(), Coord { x: 9, y: 9 });
    }

    #[test]
    fn snapshot_preserves_unknown_fields() {
        let json = r#"{"players":[],"turn":12,"zone":"crypt"}"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.extra["turn"], 12);
        let back = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(back["zone"], "crypt");
    }

    #[test]
    fn hud_fractions() {
        let p = player("a", 0, 0);
        assert!((p.hp_fraction() - 0.25).abs() < 1e-6);
        assert!((p.xp_fraction() - 0.5).abs() < 1e-6);
        let mut dead = p.clone();
        dead.max_hp = 0;
        assert_eq!(dead.hp_fraction(), 0.0);
        assert_eq!(p.summary_lines()[1], "Lvl 2 mage");
    }
}
