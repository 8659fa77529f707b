//! Error types for the question supply.

/// Why a fetch from a question source failed.
///
/// These never reach the game state machine when the source is wrapped in
/// a [`ResilientSource`](crate::ResilientSource).
#[derive(Debug, thiserror::Error)]
pub enum SupplyError {
    /// Upstream answered HTTP 429.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Building the client, sending, or decoding failed (includes timeouts).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success HTTP status other than 429.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Upstream answered 200 but reported a non-zero `response_code`.
    #[error("upstream response code {0}")]
    Upstream(i64),

    /// Upstream returned no usable questions.
    #[error("upstream returned no questions")]
    Empty,
}
