//! The one place a [`Room`] becomes something clients may see.
//!
//! Every `state_update` goes through [`project`]. It never includes the
//! round's question list, and it copies the current question's answer key
//! only when the status reveals it. There is no privileged variant: the
//! host gets the same projection as everyone else.

use hivequiz_protocol::{LobbyEntry, PlayerView, QuestionView, RoomView, TeamView};
use hivequiz_questions::Question;

use crate::Room;

/// Projects the full room state into the broadcastable view.
pub fn project(room: &Room) -> RoomView {
    let reveal = room.status.reveals_answer();

    RoomView {
        code: room.code.clone(),
        host_id: room.host_id,
        status: room.status,
        players: room
            .players
            .values()
            .map(|p| {
                (
                    p.id,
                    PlayerView {
                        id: p.id,
                        name: p.name.clone(),
                        team_id: p.team_id,
                        is_host: p.is_host,
                    },
                )
            })
            .collect(),
        teams: room
            .teams
            .values()
            .map(|t| {
                (
                    t.id,
                    TeamView {
                        id: t.id,
                        name: t.name.clone(),
                        score: t.score,
                        members: t.members.clone(),
                        current_answer_id: t.current_answer_id,
                        last_answer_time: t.last_answer_time,
                        last_answered_by: t.last_answered_by,
                    },
                )
            })
            .collect(),
        current_question_index: room.current_question_index,
        current_question_ends_at: room.current_question_ends_at,
        round_number: room.round_number,
        config: room.config.clone(),
        question_count: room.questions.len(),
        current_question: room.current_question().map(|q| question_view(q, reveal)),
    }
}

fn question_view(question: &Question, reveal: bool) -> QuestionView {
    QuestionView {
        id: question.id,
        text: question.text.clone(),
        category: question.category.clone(),
        answers: question.answers.clone(),
        correct_answer_id: reveal.then(|| question.correct_answer_id()),
    }
}

/// The lobby directory row for a room.
pub fn lobby_entry(room: &Room) -> LobbyEntry {
    LobbyEntry {
        code: room.code.clone(),
        status: room.status,
        player_count: room.players.len(),
        team_count: room.teams.len(),
        host_name: room
            .players
            .values()
            .find(|p| p.is_host)
            .map(|p| p.name.clone()),
    }
}
