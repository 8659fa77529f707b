//! Hive-mind scoring.
//!
//! Runs once per question, at the reveal. Every team whose recorded answer
//! matches the key gets [`BASE_POINTS`]. The faster half of the correct
//! teams (rounded up) also gets [`SPEED_BONUS`]. Speed is the elapsed time
//! from question start to the team's recorded answer; equal times are
//! ordered by submission sequence, earliest first.

use hivequiz_protocol::TeamId;
use hivequiz_questions::Question;

use crate::Team;

/// Points for a correct answer.
pub const BASE_POINTS: u64 = 100;

/// Extra points for the faster half of correct teams.
pub const SPEED_BONUS: u64 = 20;

/// What one team earned on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDelta {
    pub team_id: TeamId,
    pub correct: bool,
    pub bonus: bool,
    pub points: u64,
}

/// Computes the deltas for every team. Does not modify the teams.
///
/// `question` is `None` when there is no current question; nobody scores.
pub fn score<'a>(
    question: Option<&Question>,
    teams: impl IntoIterator<Item = &'a Team>,
) -> Vec<ScoreDelta> {
    let mut deltas: Vec<ScoreDelta> = Vec::new();
    // (elapsed ms, submission seq, index into deltas)
    let mut ranking: Vec<(u64, u64, usize)> = Vec::new();

    for team in teams {
        let is_correct = question.is_some_and(|q| q.is_correct(team.current_answer_id));
        if is_correct {
            ranking.push((team.last_answer_time, team.answer_seq, deltas.len()));
        }
        deltas.push(ScoreDelta {
            team_id: team.id,
            correct: is_correct,
            bonus: false,
            points: if is_correct { BASE_POINTS } else { 0 },
        });
    }

    ranking.sort_unstable();
    let cutoff = ranking.len().div_ceil(2);
    for &(_, _, idx) in ranking.iter().take(cutoff) {
        deltas[idx].bonus = true;
        deltas[idx].points += SPEED_BONUS;
    }

    deltas
}

#[cfg(test)]
mod tests {
    use hivequiz_protocol::AnswerId;

    use super::*;

    /// A question plus its correct and one wrong answer id.
    fn question() -> (Question, AnswerId, AnswerId) {
        let q = Question::new("2 + 2?", "Math", "4", ["3", "5", "22"]);
        let key = q.correct_answer_id();
        let wrong = q.answers.iter().find(|a| a.id != key).unwrap().id;
        (q, key, wrong)
    }

    fn team(name: &str, answer: Option<AnswerId>, time: u64, seq: u64) -> Team {
        let mut team = Team::new(name.to_string());
        team.current_answer_id = answer;
        team.last_answer_time = time;
        team.answer_seq = seq;
        team
    }

    fn points_of(deltas: &[ScoreDelta], team: &Team) -> u64 {
        deltas.iter().find(|d| d.team_id == team.id).unwrap().points
    }

    #[test]
    fn test_four_team_example() {
        let (q, key, wrong) = question();
        let a = team("A", Some(key), 2000, 2);
        let b = team("B", Some(key), 5000, 4);
        let c = team("C", Some(wrong), 3000, 3);
        let d = team("D", Some(key), 1000, 1);

        let deltas = score(Some(&q), [&a, &b, &c, &d]);

        assert_eq!(points_of(&deltas, &d), 120);
        assert_eq!(points_of(&deltas, &a), 120);
        assert_eq!(points_of(&deltas, &b), 100);
        assert_eq!(points_of(&deltas, &c), 0);
    }

    #[test]
    fn test_single_correct_team_gets_bonus() {
        let (q, key, _) = question();
        let a = team("A", Some(key), 9000, 1);
        let deltas = score(Some(&q), [&a]);
        assert_eq!(deltas[0].points, BASE_POINTS + SPEED_BONUS);
        assert!(deltas[0].bonus);
    }

    #[test]
    fn test_unanswered_team_scores_zero() {
        let (q, _, _) = question();
        let silent = team("Quiet", None, 0, 0);
        let deltas = score(Some(&q), [&silent]);
        assert!(!deltas[0].correct);
        assert_eq!(deltas[0].points, 0);
    }

    #[test]
    fn test_answer_from_another_question_scores_zero() {
        let (q, _, _) = question();
        let (_, other_key, _) = question();
        let a = team("A", Some(other_key), 1000, 1);
        let deltas = score(Some(&q), [&a]);
        assert!(!deltas[0].correct);
        assert_eq!(deltas[0].points, 0);
    }

    #[test]
    fn test_no_question_scores_nothing() {
        let a = team("A", None, 0, 0);
        let deltas = score(None, [&a]);
        assert_eq!(deltas[0].points, 0);
    }

    #[test]
    fn test_tie_broken_by_submission_order() {
        let (q, key, _) = question();
        let late = team("Late", Some(key), 1500, 7);
        let early = team("Early", Some(key), 1500, 3);
        let slow = team("Slow", Some(key), 4000, 1);
        let slower = team("Slower", Some(key), 6000, 2);

        let deltas = score(Some(&q), [&late, &early, &slow, &slower]);

        // Four correct: two bonuses. Both 1500 ms teams qualify.
        assert_eq!(points_of(&deltas, &early), 120);
        assert_eq!(points_of(&deltas, &late), 120);
        assert_eq!(points_of(&deltas, &slow), 100);

        // Five correct, three bonuses: the 4000 ms tie sits on the cutoff.
        let boundary = team("Boundary", Some(key), 4000, 0);
        let deltas = score(Some(&q), [&late, &early, &slow, &slower, &boundary]);
        assert_eq!(points_of(&deltas, &boundary), 120, "seq 0 beats seq 1 at 4000 ms");
        assert_eq!(points_of(&deltas, &slow), 100);
    }
}
