//! The [`QuestionSource`] trait and the request it answers.

use std::future::Future;

use hivequiz_protocol::GameConfig;

use crate::{Question, SupplyError};

/// What the room asks for at the start of each round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub amount: u32,
    /// Upstream difficulty codes. Empty means any.
    pub difficulties: Vec<String>,
    /// Upstream category codes. Empty means any.
    pub categories: Vec<String>,
}

impl From<&GameConfig> for QuestionRequest {
    fn from(config: &GameConfig) -> Self {
        Self {
            amount: config.amount,
            difficulties: config.difficulties.iter().cloned().collect(),
            categories: config.categories.iter().cloned().collect(),
        }
    }
}

/// Something that can produce a round's worth of questions.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static`: one source is shared by every room actor,
///   and fetches run on spawned tasks.
///
/// # Example
///
/// ```rust
/// use hivequiz_questions::{Question, QuestionRequest, QuestionSource, SupplyError};
///
/// /// Always asks the same question.
/// struct Parrot;
///
/// impl QuestionSource for Parrot {
///     async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, SupplyError> {
///         Ok((0..request.amount)
///             .map(|_| Question::new("Polly?", "Birds", "Yes", ["No"]))
///             .collect())
///     }
/// }
/// ```
pub trait QuestionSource: Send + Sync + 'static {
    /// Returns up to `request.amount` questions, in play order.
    fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> impl Future<Output = Result<Vec<Question>, SupplyError>> + Send;
}
