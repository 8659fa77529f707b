//! The public projection of a room: everything a client is allowed to see.
//!
//! Nothing in this module carries a question's answer key unconditionally.
//! [`QuestionView::correct_answer_id`] is an `Option` that the server fills
//! in only once the answer has been revealed; the full question record
//! lives in `hivequiz-questions` and has no `Serialize` impl at all.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AnswerId, PlayerId, QuestionId, RoomCode, TeamId};

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// The phase a room's game is in.
///
/// ```text
/// Lobby → Loading → LobbyReady → Question ⇄ Reveal → RoundEnd → Loading …
///                                                        ↘
///                          (host END_GAME from anywhere) → Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Created, waiting for the host to start the first round.
    #[default]
    Lobby,
    /// A question list is being fetched.
    Loading,
    /// Questions are loaded; waiting for the host to show the first one.
    LobbyReady,
    /// A question is on screen and its deadline is running.
    Question,
    /// The current question's answer has been revealed and scored.
    Reveal,
    /// Every question of the round has been played.
    RoundEnd,
    /// The host ended the game. No further question flow.
    Finished,
}

impl GameStatus {
    /// Returns `true` if the room shows up in the lobby directory.
    pub fn is_listed(self) -> bool {
        matches!(self, Self::Lobby | Self::LobbyReady | Self::Loading)
    }

    /// Returns `true` if the current question's answer key may be sent.
    pub fn reveals_answer(self) -> bool {
        matches!(self, Self::Reveal | Self::Finished)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::Loading => "LOADING",
            Self::LobbyReady => "LOBBY_READY",
            Self::Question => "QUESTION",
            Self::Reveal => "REVEAL",
            Self::RoundEnd => "ROUND_END",
            Self::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Parameters the host picks when starting a game.
///
/// Stored on the room and reused for every later round until the host
/// starts a new game. Categories and difficulties are opaque upstream
/// codes; an empty set means "any".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Questions per round.
    pub amount: u32,
    /// Upstream category codes to draw from.
    pub categories: BTreeSet<String>,
    /// Upstream difficulty codes to draw from.
    pub difficulties: BTreeSet<String>,
    /// Seconds each question stays open.
    pub question_duration_sec: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            amount: 10,
            categories: BTreeSet::new(),
            difficulties: BTreeSet::from(["medium".to_string()]),
            question_duration_sec: 60,
        }
    }
}

impl GameConfig {
    /// Smallest round size.
    pub const MIN_AMOUNT: u32 = 1;
    /// Largest round size.
    pub const MAX_AMOUNT: u32 = 50;
    /// Shortest question window in seconds.
    pub const MIN_DURATION_SEC: u32 = 5;
    /// Longest question window in seconds.
    pub const MAX_DURATION_SEC: u32 = 240;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - `amount` clamped to [`Self::MIN_AMOUNT`]..=[`Self::MAX_AMOUNT`].
    /// - `question_duration_sec` clamped to
    ///   [`Self::MIN_DURATION_SEC`]..=[`Self::MAX_DURATION_SEC`].
    /// - blank codes are dropped, the rest trimmed.
    pub fn validated(mut self) -> Self {
        let amount = self.amount.clamp(Self::MIN_AMOUNT, Self::MAX_AMOUNT);
        if amount != self.amount {
            tracing::warn!(requested = self.amount, amount, "amount out of range, clamping");
            self.amount = amount;
        }

        let duration = self
            .question_duration_sec
            .clamp(Self::MIN_DURATION_SEC, Self::MAX_DURATION_SEC);
        if duration != self.question_duration_sec {
            tracing::warn!(
                requested = self.question_duration_sec,
                duration,
                "question duration out of range, clamping"
            );
            self.question_duration_sec = duration;
        }

        self.categories = clean_codes(self.categories);
        self.difficulties = clean_codes(self.difficulties);
        self
    }

    /// How long each question stays open.
    pub fn question_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.question_duration_sec))
    }

    /// The question window in milliseconds.
    pub fn question_duration_ms(&self) -> u64 {
        u64::from(self.question_duration_sec) * 1000
    }
}

fn clean_codes(codes: BTreeSet<String>) -> BTreeSet<String> {
    codes
        .into_iter()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Question projection
// ---------------------------------------------------------------------------

/// One answer option. Public: the text and id of every option are shown
/// from the moment the question appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
}

/// The current question as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub category: String,
    /// Options in their fixed presentation order.
    pub answers: Vec<Answer>,
    /// Present only while the room is in `REVEAL` or `FINISHED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_id: Option<AnswerId>,
}

// ---------------------------------------------------------------------------
// Room projection
// ---------------------------------------------------------------------------

/// A room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub team_id: Option<TeamId>,
    pub is_host: bool,
}

/// A team and its in-flight answer.
///
/// Teammates see each other's choice while the question is open; only the
/// answer key is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub score: u64,
    pub members: BTreeSet<PlayerId>,
    pub current_answer_id: Option<AnswerId>,
    /// Milliseconds from question start to the recorded answer.
    pub last_answer_time: u64,
    pub last_answered_by: Option<PlayerId>,
}

/// The full room state pushed with every `state_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub status: GameStatus,
    pub players: BTreeMap<PlayerId, PlayerView>,
    pub teams: BTreeMap<TeamId, TeamView>,
    pub current_question_index: usize,
    /// Epoch milliseconds. Meaningful only while `status` is `QUESTION`.
    pub current_question_ends_at: u64,
    pub round_number: u32,
    pub config: GameConfig,
    /// Number of questions in the current round.
    pub question_count: usize,
    pub current_question: Option<QuestionView>,
}

/// One row of the lobby directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyEntry {
    pub code: RoomCode,
    pub status: GameStatus,
    pub player_count: usize,
    pub team_count: usize,
    pub host_name: Option<String>,
}
