//! Unified error type for the Hivequiz server.

use hivequiz_protocol::ProtocolError;
use hivequiz_questions::SupplyError;
use hivequiz_room::RoomError;
use hivequiz_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HivequizError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, full, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The question source could not be constructed.
    #[error(transparent)]
    Supply(#[from] SupplyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let err: HivequizError = err.into();
        assert!(matches!(err, HivequizError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: HivequizError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, HivequizError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: HivequizError = RoomError::NotFound(hivequiz_protocol::RoomCode::new("ab12")).into();
        assert!(matches!(err, HivequizError::Room(_)));
        assert!(err.to_string().contains("AB12"));
    }

    #[test]
    fn test_from_supply_error() {
        let err: HivequizError = SupplyError::RateLimited.into();
        assert!(matches!(err, HivequizError::Supply(_)));
    }
}
