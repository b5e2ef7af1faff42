//! Live session protocol.
//!
//! The server speaks text-framed JSON tagged by a `type` field. Inbound
//! frames become [`ServerEvent`] messages that the state-update step applies
//! once per tick; the client only ever sends [`ClientMessage::Subscribe`].
//!
//! Unknown `type`s are not errors: newer servers may broadcast events this
//! client does not render.

use std::sync::Arc;

use bevy_ecs::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::resources::gamestatestore::{GameSnapshot, Player};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no string `type` field")]
    MissingType,
    #[error("`{kind}` payload is malformed: {source}")]
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// A die roll broadcast by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub username: String,
    pub roll: i64,
    pub sides: i64,
    #[serde(default, rename = "isCritical")]
    pub is_critical: bool,
}

impl DiceRoll {
    /// Event log line for this roll.
    pub fn describe(&self) -> String {
        format!(
            "{} rolled {}/{}{}",
            self.username,
            self.roll,
            self.sides,
            if self.is_critical { " (CRITICAL!)" } else { "" }
        )
    }
}

/// Parsed server-to-client event.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum ServerEvent {
    GameUpdate(Arc<GameSnapshot>),
    PlayerMove(Arc<Player>),
    DiceRoll(DiceRoll),
}

/// Client-to-server message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Subscribe,
}

impl ClientMessage {
    pub fn to_json(&self) -> String {
        // A unit-variant enum with an internal tag always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[derive(Deserialize)]
struct GameUpdateFrame {
    data: GameSnapshot,
}

#[derive(Deserialize)]
struct PlayerMoveFrame {
    player: Player,
}

fn payload<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    frame: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(frame).map_err(|source| ProtocolError::Payload { kind, source })
}

/// Parse one inbound text frame.
///
/// Returns `Ok(None)` for well-formed frames of a type this client ignores.
pub fn parse_server_message(text: &str) -> Result<Option<ServerEvent>, ProtocolError> {
    let frame: Value = serde_json::from_str(text)?;
    let kind = frame
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_owned();

    let event = match kind.as_str() {
        "gameUpdate" => {
            let GameUpdateFrame { data } = payload("gameUpdate", frame)?;
            ServerEvent::GameUpdate(Arc::new(data))
        }
        "playerMove" => {
            let PlayerMoveFrame { player } = payload("playerMove", frame)?;
            ServerEvent::PlayerMove(Arc::new(player))
        }
        "diceRoll" => ServerEvent::DiceRoll(payload("diceRoll", frame)?),
        _ => return Ok(None),
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_wire_format() {
        assert_eq!(ClientMessage::Subscribe.to_json(), r#"{"type":"subscribe"}"#);
    }

    #[test]
    fn parses_game_update() {
        let text = r#"{"type":"gameUpdate","data":{"players":[
            {"id":1,"username":"a","x":0,"y":0},
            {"id":2,"username":"b","x":5,"y":6}]}}"#;
        match parse_server_message(text).unwrap() {
            Some(ServerEvent::GameUpdate(snapshot)) => {
                assert_eq!(snapshot.latest_player().unwrap().username, "b");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_player_move() {
        let text = r#"{"type":"playerMove","player":{"id":"x","username":"a","x":1,"y":2}}"#;
        match parse_server_message(text).unwrap() {
            Some(ServerEvent::PlayerMove(p)) => assert_eq!((p.x, p.y), (1, 2)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_critical_dice_roll() {
        let text = r#"{"type":"diceRoll","username":"A","roll":20,"sides":20,"isCritical":true}"#;
        match parse_server_message(text).unwrap() {
            Some(ServerEvent::DiceRoll(roll)) => {
                assert!(roll.is_critical);
                assert_eq!(roll.describe(), "A rolled 20/20 (CRITICAL!)");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn plain_roll_has_no_critical_suffix() {
        let roll = DiceRoll {
            username: "B".into(),
            roll: 3,
            sides: 6,
            is_critical: false,
        };
        assert_eq!(roll.describe(), "B rolled 3/6");
    }

    #[test]
    fn unknown_types_are_ignored() {
        assert!(
            parse_server_message(r#"{"type":"weather","rain":true}"#)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(
            parse_server_message("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            parse_server_message(r#"{"data":{}}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            parse_server_message(r#"{"type":"playerMove","player":{"id":1}}"#),
            Err(ProtocolError::Payload {
                kind: "playerMove",
                ..
            })
        ));
    }
}
