//! Named real-time events.
//!
//! Every frame on the wire is one JSON object of the shape
//! `{ "event": "<name>", "data": { ... } }`. Inbound frames decode into
//! [`ClientEvent`], outbound frames encode from [`ServerEvent`].
//!
//! Host actions nest one level further, mirroring what browser clients
//! send: `{ "roomCode": "K7QX", "action": "KICK_PLAYER", "payload": { "playerId": 4 } }`.

use serde::{Deserialize, Serialize};

use crate::{
    AnswerId, GameConfig, LobbyEntry, PlayerId, ProtocolError, RoomCode, RoomView, TeamId,
};

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Create a room and join it as its host.
    #[serde(rename_all = "camelCase")]
    CreateRoom { host_name: String },

    /// Join an existing room as a player without a team.
    #[serde(rename_all = "camelCase")]
    JoinGame { room_code: RoomCode, name: String },

    /// Create a team and move into it.
    #[serde(rename_all = "camelCase")]
    CreateTeam { room_code: RoomCode, team_name: String },

    /// Move into an existing team.
    #[serde(rename_all = "camelCase")]
    JoinTeam { room_code: RoomCode, team_id: TeamId },

    /// Record the team's answer for the open question.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer { room_code: RoomCode, answer_id: AnswerId },

    /// Host-only game control.
    #[serde(rename_all = "camelCase")]
    HostAction {
        room_code: RoomCode,
        #[serde(flatten)]
        action: HostAction,
    },

    /// Ask for the rooms that can currently be joined.
    ///
    /// Takes no arguments. Whatever `data` the client sends (nothing,
    /// `null`, `{}`) is accepted and ignored.
    ListLobbies(Option<serde_json::Value>),
}

// ---------------------------------------------------------------------------
// HostAction
// ---------------------------------------------------------------------------

/// Privileged actions. Rejected silently unless sent by the room's host.
///
/// On the wire an action is a name plus a free-form `payload`, and clients
/// send `payload: {}` even for actions that take no arguments. Decoding
/// goes through [`HostActionFrame`] so those empty payloads are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HostActionFrame", into = "HostActionFrame")]
pub enum HostAction {
    StartGame(GameConfig),
    NextQuestion,
    Reveal,
    NextRound,
    EndGame,
    KickPlayer { player_id: PlayerId },
}

/// Name of a host action as it appears in the `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostActionKind {
    StartGame,
    NextQuestion,
    Reveal,
    NextRound,
    EndGame,
    KickPlayer,
}

/// The raw `{ action, payload }` pair before the payload is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostActionFrame {
    pub action: HostActionKind,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KickPayload {
    player_id: PlayerId,
}

impl TryFrom<HostActionFrame> for HostAction {
    type Error = ProtocolError;

    fn try_from(frame: HostActionFrame) -> Result<Self, Self::Error> {
        Ok(match frame.action {
            HostActionKind::StartGame => {
                let config = if frame.payload.is_null() {
                    GameConfig::default()
                } else {
                    serde_json::from_value(frame.payload).map_err(ProtocolError::Decode)?
                };
                Self::StartGame(config)
            }
            HostActionKind::NextQuestion => Self::NextQuestion,
            HostActionKind::Reveal => Self::Reveal,
            HostActionKind::NextRound => Self::NextRound,
            HostActionKind::EndGame => Self::EndGame,
            HostActionKind::KickPlayer => {
                let KickPayload { player_id } =
                    serde_json::from_value(frame.payload).map_err(ProtocolError::Decode)?;
                Self::KickPlayer { player_id }
            }
        })
    }
}

impl From<HostAction> for HostActionFrame {
    fn from(action: HostAction) -> Self {
        let (action, payload) = match action {
            HostAction::StartGame(config) => (
                HostActionKind::StartGame,
                serde_json::to_value(config).unwrap_or_default(),
            ),
            HostAction::NextQuestion => (HostActionKind::NextQuestion, empty_payload()),
            HostAction::Reveal => (HostActionKind::Reveal, empty_payload()),
            HostAction::NextRound => (HostActionKind::NextRound, empty_payload()),
            HostAction::EndGame => (HostActionKind::EndGame, empty_payload()),
            HostAction::KickPlayer { player_id } => (
                HostActionKind::KickPlayer,
                serde_json::json!({ "playerId": player_id }),
            ),
        };
        Self { action, payload }
    }
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl HostAction {
    /// The wire name of this action.
    pub fn kind(&self) -> HostActionKind {
        match self {
            Self::StartGame(_) => HostActionKind::StartGame,
            Self::NextQuestion => HostActionKind::NextQuestion,
            Self::Reveal => HostActionKind::Reveal,
            Self::NextRound => HostActionKind::NextRound,
            Self::EndGame => HostActionKind::EndGame,
            Self::KickPlayer { .. } => HostActionKind::KickPlayer,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// Everything the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection: the id the server knows you by.
    #[serde(rename_all = "camelCase")]
    Welcome { player_id: PlayerId },

    /// The sanitized room projection, pushed to every room member after
    /// each mutation.
    StateUpdate(Box<RoomView>),

    /// A failure the caller should see (e.g. unknown room code).
    Error { message: String },

    /// You were removed from the room by the host.
    Kicked,

    /// Reply to `list_lobbies`.
    OpenLobbies(Vec<LobbyEntry>),
}

impl ServerEvent {
    /// Convenience constructor for [`ServerEvent::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
