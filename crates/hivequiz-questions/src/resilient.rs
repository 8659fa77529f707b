//! Retry and fallback policy around any [`QuestionSource`].

use std::time::Duration;

use tracing::warn;

use crate::{OfflineSource, Question, QuestionRequest, QuestionSource, SupplyConfig, SupplyError};

/// Wraps a source so that a fetch always yields questions.
///
/// - `RateLimited` → wait `backoff`, then retry once.
/// - any other failure, or a failed retry → [`OfflineSource`] questions.
/// - a short result (e.g. a later upstream batch failed) is topped up
///   with offline questions to the requested amount.
///
/// `fetch` therefore never returns `Err`; the room layer still handles
/// `Err` so it works with unwrapped sources too.
pub struct ResilientSource<S> {
    inner: S,
    offline: OfflineSource,
    backoff: Duration,
}

impl<S: QuestionSource> ResilientSource<S> {
    pub fn new(inner: S, backoff: Duration) -> Self {
        Self {
            inner,
            offline: OfflineSource,
            backoff,
        }
    }

    /// Uses the rate-limit backoff from `config`.
    pub fn with_config(inner: S, config: &SupplyConfig) -> Self {
        Self::new(inner, config.rate_limit_backoff)
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn top_up(&self, request: &QuestionRequest, mut questions: Vec<Question>) -> Vec<Question> {
        let wanted = request.amount as usize;
        if questions.len() < wanted {
            let missing = wanted - questions.len();
            warn!(got = questions.len(), missing, "short question list, topping up from offline backup");
            questions.extend(self.offline.questions(missing as u32));
        }
        questions
    }

    fn fallback(&self, request: &QuestionRequest, error: &SupplyError) -> Vec<Question> {
        warn!(%error, amount = request.amount, "question supply failed, using offline backup");
        self.offline.questions(request.amount)
    }
}

impl<S: QuestionSource> QuestionSource for ResilientSource<S> {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, SupplyError> {
        match self.inner.fetch(request).await {
            Ok(questions) => Ok(self.top_up(request, questions)),
            Err(SupplyError::RateLimited) => {
                warn!(backoff_ms = self.backoff.as_millis() as u64, "rate limited, retrying once");
                tokio::time::sleep(self.backoff).await;
                match self.inner.fetch(request).await {
                    Ok(questions) => Ok(self.top_up(request, questions)),
                    Err(error) => Ok(self.fallback(request, &error)),
                }
            }
            Err(error) => Ok(self.fallback(request, &error)),
        }
    }
}
