//! Error types for the room layer.
//!
//! Only failures a caller can act on are errors. A non-host sending a host
//! action, a duplicate team name, or an answer outside the question phase
//! are rejections: the room logs them and does nothing.

use hivequiz_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room has no free player slots.
    #[error("room {0} is full")]
    Full(RoomCode),

    /// The player is not a member of any room.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// The operation cannot proceed in the current state.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's actor has stopped or its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The text shown to a player in an `error` event.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) | Self::Unavailable(_) => "Room not found".to_string(),
            Self::Full(_) => "Room is full".to_string(),
            Self::NotInRoom(_) => "You are not in a room".to_string(),
            Self::InvalidState(reason) => reason.clone(),
        }
    }
}
