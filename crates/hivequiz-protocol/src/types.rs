//! Identity types shared by every Hivequiz layer.
//!
//! These are the keys that travel on the wire and index the server's
//! in-memory state. Each one is a newtype so a `TeamId` can never be
//! passed where an `AnswerId` is expected, even though both are UUIDs
//! underneath.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// Identifies one connection, and therefore one player.
///
/// The transport assigns these from a monotonic counter. A player IS a
/// connection: there is no account behind it, so reconnecting yields a
/// fresh id.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short, human-typeable key of a room (e.g. `"K7QX"`).
///
/// Codes are case-insensitive for humans, so every constructor trims and
/// upper-cases its input. `#[serde(from = "String")]` routes deserialization
/// through the same normalization, which means a client sending `"k7qx "`
/// addresses the same room as one sending `"K7QX"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a code from raw user input.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// UUID-backed ids
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(
    /// Identifies a team within a room. Opaque, generated when the team is created.
    TeamId
);

uuid_id!(
    /// Identifies a question. Generated when the question is normalized.
    QuestionId
);

uuid_id!(
    /// Identifies one answer option of one question.
    ///
    /// Answer ids are generated per question, so the id of the correct
    /// answer carries no information about its text or position.
    AnswerId
);
