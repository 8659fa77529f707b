//! The offline backup set.

use crate::{Question, QuestionRequest, QuestionSource, SupplyError};

/// Category shown for every backup question.
pub const BACKUP_CATEGORY: &str = "Backup Mode";

const BACKUP: [(&str, &str, [&str; 3]); 4] = [
    (
        "What is the capital of France?",
        "Paris",
        ["London", "Berlin", "Madrid"],
    ),
    (
        "Which planet is closest to the Sun?",
        "Mercury",
        ["Venus", "Mars", "Jupiter"],
    ),
    ("How many legs does a spider have?", "8", ["6", "10", "12"]),
    ("What is H2O?", "Water", ["Gold", "Silver", "Salt"]),
];

/// Serves four fixed questions, cycled to fill the requested amount.
///
/// Used when upstream is unreachable, and directly when the server runs
/// with `HIVEQUIZ_OFFLINE=1`. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl OfflineSource {
    /// Builds `amount` backup questions. Each call produces fresh ids and a
    /// fresh answer order.
    pub fn questions(&self, amount: u32) -> Vec<Question> {
        BACKUP
            .iter()
            .cycle()
            .take(amount as usize)
            .map(|(text, correct, incorrect)| {
                Question::new(*text, BACKUP_CATEGORY, *correct, *incorrect)
            })
            .collect()
    }
}

impl QuestionSource for OfflineSource {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, SupplyError> {
        Ok(self.questions(request.amount))
    }
}
