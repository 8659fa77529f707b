//! # hivequiz-questions
//!
//! Turns "give me N questions of these difficulties and categories" into a
//! list of [`Question`] records.
//!
//! - [`QuestionSource`]: the trait the room layer depends on.
//! - [`OpenTdbSource`]: the Open Trivia DB HTTP client.
//! - [`OfflineSource`]: a fixed backup set, always available.
//! - [`ResilientSource`]: wraps any source with the retry-once / fall back
//!   to offline policy, so callers only ever see a question list.
//!
//! A [`Question`] carries its answer key. It deliberately has no
//! `Serialize` impl; the room layer projects it into a
//! [`QuestionView`](hivequiz_protocol::QuestionView) before anything
//! reaches the wire.

mod config;
mod error;
mod offline;
mod opentdb;
mod question;
mod resilient;
mod source;

pub use config::SupplyConfig;
pub use error::SupplyError;
pub use offline::OfflineSource;
pub use opentdb::OpenTdbSource;
pub use question::Question;
pub use resilient::ResilientSource;
pub use source::{QuestionRequest, QuestionSource};
