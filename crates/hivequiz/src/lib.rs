//! # Hivequiz
//!
//! Real-time team trivia server. Players connect over WebSocket, gather in
//! rooms under a short code, form teams, and answer timed multiple-choice
//! questions together. The host drives the game; the server owns all state
//! and only ever sends clients a sanitized view of it.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → RoomManager → Room actors
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hivequiz::prelude::*;
//!
//! # async fn run() -> Result<(), HivequizError> {
//! let server = HivequizServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build(OfflineSource)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::HivequizError;
pub use server::{HivequizServer, HivequizServerBuilder};

/// Everything needed to start a server, in one import.
pub mod prelude {
    pub use crate::{HivequizError, HivequizServer, HivequizServerBuilder};
    pub use hivequiz_protocol::{
        ClientEvent, GameConfig, GameStatus, HostAction, PlayerId, RoomCode, RoomView,
        ServerEvent,
    };
    pub use hivequiz_questions::{
        OfflineSource, OpenTdbSource, QuestionSource, ResilientSource, SupplyConfig,
    };
    pub use hivequiz_room::RoomConfig;
}
