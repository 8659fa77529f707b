//! Rooms for Hivequiz.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`Room`] aggregate, its question deadline, and the outbound channels of
//! its members.
//!
//! # Key types
//!
//! - [`Room`]: the synchronous trivia state machine
//! - [`RoomManager`]: creates/deletes rooms, routes players, lists lobbies
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`scoring::score`]: hive-mind scoring at the reveal
//! - [`sanitize::project`]: the only way room state reaches clients
//! - [`RoomConfig`]: server-side room limits

mod config;
mod error;
mod game;
mod manager;
mod room;
pub mod sanitize;
pub mod scoring;

pub use config::RoomConfig;
pub use error::RoomError;
pub use game::{Effect, Player, PlayerAction, Room, Team};
pub use manager::{RoomManager, generate_code};
pub use room::{PlayerSender, RoomHandle, RoomOutcome};
pub use scoring::ScoreDelta;
