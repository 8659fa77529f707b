//! Settings for the Open Trivia DB client.

use std::time::Duration;

/// Tunables for [`OpenTdbSource`](crate::OpenTdbSource) and
/// [`ResilientSource`](crate::ResilientSource).
#[derive(Debug, Clone)]
pub struct SupplyConfig {
    /// Endpoint that serves questions, without a query string.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Most questions upstream returns for one request.
    pub max_batch: u32,
    /// Most upstream requests issued for one fetch.
    pub max_batches: u32,
    /// How long to wait after a 429 before the single retry.
    pub rate_limit_backoff: Duration,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opentdb.com/api.php".to_string(),
            timeout: Duration::from_secs(5),
            max_batch: 50,
            max_batches: 4,
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}
