//! The full, secret-bearing question record.

use hivequiz_protocol::{Answer, AnswerId, QuestionId};
use rand::seq::SliceRandom;

/// One multiple-choice question, including which answer is correct.
///
/// Answers are shuffled once, when the question is built, and every
/// answer gets a fresh random id. The order and the ids never change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub category: String,
    /// Options in presentation order.
    pub answers: Vec<Answer>,
    correct_answer_id: AnswerId,
}

impl Question {
    /// Builds a question from one correct and any number of wrong answers.
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        correct: impl Into<String>,
        incorrect: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let correct_answer_id = AnswerId::new();
        let mut answers = vec![Answer {
            id: correct_answer_id,
            text: correct.into(),
        }];
        answers.extend(incorrect.into_iter().map(|text| Answer {
            id: AnswerId::new(),
            text: text.into(),
        }));
        answers.shuffle(&mut rand::rng());

        Self {
            id: QuestionId::new(),
            text: text.into(),
            category: category.into(),
            answers,
            correct_answer_id,
        }
    }

    /// The id of the correct answer. Never send this before the reveal.
    pub fn correct_answer_id(&self) -> AnswerId {
        self.correct_answer_id
    }

    /// Returns `true` if `answer` is the correct one.
    pub fn is_correct(&self, answer: Option<AnswerId>) -> bool {
        answer == Some(self.correct_answer_id)
    }

    /// Returns `true` if `answer` is one of this question's options.
    pub fn has_answer(&self, answer: AnswerId) -> bool {
        self.answers.iter().any(|a| a.id == answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::new("2 + 2?", "Math", "4", ["3", "5", "22"])
    }

    #[test]
    fn test_correct_answer_is_among_options() {
        let q = sample();
        assert_eq!(q.answers.len(), 4);
        assert!(q.has_answer(q.correct_answer_id()));
        let correct = q
            .answers
            .iter()
            .find(|a| a.id == q.correct_answer_id())
            .unwrap();
        assert_eq!(correct.text, "4");
    }

    #[test]
    fn test_answer_ids_are_distinct() {
        let q = sample();
        let mut ids: Vec<_> = q.answers.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_is_correct() {
        let q = sample();
        assert!(q.is_correct(Some(q.correct_answer_id())));
        assert!(!q.is_correct(None));
        let wrong = q
            .answers
            .iter()
            .find(|a| a.id != q.correct_answer_id())
            .unwrap();
        assert!(!q.is_correct(Some(wrong.id)));
    }

    #[test]
    fn test_foreign_answer_is_not_an_option() {
        assert!(!sample().has_answer(AnswerId::new()));
    }
}
