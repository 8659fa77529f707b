//! Wire protocol for Hivequiz.
//!
//! This crate defines the "language" that trivia clients and the server
//! speak:
//!
//! - **Identifiers** ([`PlayerId`], [`RoomCode`], [`TeamId`], …)
//! - **Events** ([`ClientEvent`], [`HostAction`], [`ServerEvent`]): the
//!   named frames that travel over the real-time connection.
//! - **Views** ([`RoomView`], [`QuestionView`], [`LobbyEntry`], …): the
//!   public projection of a room. There is no type here that carries an
//!   answer key unconditionally.
//! - **Codec** ([`Codec`], [`JsonCodec`]) and [`ProtocolError`].
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Room actors (state machine)
//! ```

mod codec;
mod error;
mod events;
mod types;
mod view;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, HostAction, HostActionFrame, HostActionKind, ServerEvent};
pub use types::{AnswerId, PlayerId, QuestionId, RoomCode, TeamId};
pub use view::{
    Answer, GameConfig, GameStatus, LobbyEntry, PlayerView, QuestionView, RoomView, TeamView,
};
