//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire. Each body
//! is an object tagged by `type`; unknown fields are rejected.

use fourfall_core::GameState;
use serde::{Deserialize, Serialize};

/// Network protocol messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    deny_unknown_fields
)]
pub enum Message {
    /// Client asks to join the host's match
    JoinRequest {},

    /// Host accepted the join
    JoinAck {},

    /// Full canonical state, sent by the host after every accepted change
    GameStateSync { state: GameState },

    /// Client proposes a move
    PlayerMove { column: usize },

    /// Host refused a proposed move
    MoveRejected { reason: String },

    /// Peer is closing the connection
    Disconnect {},

    /// Informational failure
    Error { message: String },
}

impl Message {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            Message::JoinRequest {} => "JOIN_REQUEST",
            Message::JoinAck {} => "JOIN_ACK",
            Message::GameStateSync { .. } => "GAME_STATE_SYNC",
            Message::PlayerMove { .. } => "PLAYER_MOVE",
            Message::MoveRejected { .. } => "MOVE_REJECTED",
            Message::Disconnect {} => "DISCONNECT",
            Message::Error { .. } => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourfall_core::{Mode, Player};
    use serde_json::json;

    #[test]
    fn test_player_move_shape() {
        let bytes = Message::PlayerMove { column: 4 }.to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({ "type": "PLAYER_MOVE", "column": 4 }));
    }

    #[test]
    fn test_state_sync_roundtrip() {
        let state = GameState::new(Mode::OnlineHost)
            .with_first_turn(Player::Two)
            .apply_move(5, Player::Two)
            .unwrap()
            .0;
        let msg = Message::GameStateSync {
            state: state.clone(),
        };

        let decoded = Message::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.kind(), "GAME_STATE_SYNC");
    }

    #[test]
    fn test_unit_messages() {
        let decoded = Message::from_bytes(br#"{"type":"JOIN_REQUEST"}"#).unwrap();
        assert_eq!(decoded, Message::JoinRequest {});
        assert_eq!(
            Message::JoinAck {}.to_bytes().unwrap(),
            br#"{"type":"JOIN_ACK"}"#.to_vec()
        );
        assert_eq!(
            Message::Disconnect {}.to_bytes().unwrap(),
            br#"{"type":"DISCONNECT"}"#.to_vec()
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Message::from_bytes(br#"{"type":"TELEPORT","column":1}"#).is_err());
        assert!(Message::from_bytes(br#"{"column":1}"#).is_err());
    }

    #[test]
    fn test_unknown_and_missing_fields_rejected() {
        assert!(Message::from_bytes(br#"{"type":"PLAYER_MOVE","column":1,"row":2}"#).is_err());
        assert!(Message::from_bytes(br#"{"type":"PLAYER_MOVE"}"#).is_err());
        assert!(Message::from_bytes(br#"{"type":"MOVE_REJECTED"}"#).is_err());
        assert!(Message::from_bytes(br#"{"type":"JOIN_REQUEST","x":1}"#).is_err());
        assert!(Message::from_bytes(br#"{"type":"JOIN_ACK","state":null}"#).is_err());
        assert!(Message::from_bytes(br#"{"type":"DISCONNECT","reason":"bye"}"#).is_err());
    }

    #[test]
    fn test_invalid_state_in_sync_rejected() {
        let mut state = serde_json::to_value(GameState::new(Mode::OnlineHost)).unwrap();
        state["moveCount"] = json!(3);
        let body = json!({ "type": "GAME_STATE_SYNC", "state": state }).to_string();
        assert!(Message::from_bytes(body.as_bytes()).is_err());
    }
}
