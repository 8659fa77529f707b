//! The trivia game state machine.
//!
//! [`Room`] is the per-room aggregate: players, teams, the round's
//! questions, and the current [`GameStatus`]. It is plain synchronous
//! data. Every operation takes the current time as epoch milliseconds and
//! returns the [`Effect`]s the caller must carry out: broadcasts, direct
//! sends, deadline changes, and question fetches. The room actor owns one
//! `Room` and interprets those effects; tests drive a `Room` directly.
//!
//! ```text
//! LOBBY ──START_GAME──▶ LOADING ──fetch ok──▶ LOBBY_READY ──NEXT_QUESTION──▶ QUESTION
//!   ▲                      │                                                  │
//!   └──────fetch failed────┘                                 REVEAL / deadline│
//!                                                                             ▼
//! ROUND_END ◀──NEXT_QUESTION (last)── REVEAL ──NEXT_QUESTION (more)──▶ QUESTION
//!   │
//!   └──NEXT_ROUND──▶ LOADING ──fetch ok──▶ LOBBY_READY   (fetch failed ──▶ ROUND_END)
//!
//! END_GAME from any state ──▶ FINISHED
//! ```
//!
//! Rejected actions (non-host, wrong phase, unknown team, ...) change
//! nothing and return no effects.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use hivequiz_protocol::{
    AnswerId, GameConfig, GameStatus, HostAction, LobbyEntry, PlayerId, RoomCode, RoomView,
    ServerEvent, TeamId,
};
use hivequiz_questions::{Question, QuestionRequest, SupplyError};
use tracing::{debug, info, warn};

use crate::{RoomConfig, RoomError, scoring, sanitize};

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// A connection that joined the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team_id: Option<TeamId>,
    /// Fixed at join time.
    pub is_host: bool,
}

/// A team and its answer for the open question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Accumulates across questions and rounds.
    pub score: u64,
    pub members: BTreeSet<PlayerId>,
    pub current_answer_id: Option<AnswerId>,
    /// Milliseconds from question start to the recorded answer.
    pub last_answer_time: u64,
    pub last_answered_by: Option<PlayerId>,
    /// Room-wide sequence number of the recorded answer. Breaks speed ties.
    pub answer_seq: u64,
}

impl Team {
    pub fn new(name: String) -> Self {
        Self {
            id: TeamId::new(),
            name,
            score: 0,
            members: BTreeSet::new(),
            current_answer_id: None,
            last_answer_time: 0,
            last_answered_by: None,
            answer_seq: 0,
        }
    }

    fn clear_answer(&mut self) {
        self.current_answer_id = None;
        self.last_answer_time = 0;
        self.last_answered_by = None;
        self.answer_seq = 0;
    }
}

// ---------------------------------------------------------------------------
// Actions and effects
// ---------------------------------------------------------------------------

/// Something a room member asks the room to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    CreateTeam { name: String },
    JoinTeam { team_id: TeamId },
    SubmitAnswer { answer_id: AnswerId },
    Host(HostAction),
}

/// Work the room asks its owner to carry out after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Push the sanitized room view to every member.
    Broadcast,
    /// Deliver one event to one member.
    Send(PlayerId, ServerEvent),
    /// Drop this connection's membership (after any `Send` to it).
    Evict(PlayerId),
    /// Start the question deadline, replacing any pending one.
    ArmDeadline(Duration),
    /// Clear the question deadline.
    CancelDeadline,
    /// Fetch questions and report back with [`Room::fetch_completed`].
    Fetch {
        ticket: u64,
        request: QuestionRequest,
    },
}

/// Why questions are being fetched. Decides where a failure lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPurpose {
    StartGame,
    NextRound {
        prev_index: usize,
        prev_round: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    ticket: u64,
    purpose: FetchPurpose,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session.
#[derive(Debug)]
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) host_id: PlayerId,
    pub(crate) status: GameStatus,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) teams: BTreeMap<TeamId, Team>,
    pub(crate) questions: Vec<Question>,
    pub(crate) current_question_index: usize,
    pub(crate) current_question_ends_at: u64,
    pub(crate) round_number: u32,
    pub(crate) config: GameConfig,
    limits: RoomConfig,
    fetch: Option<PendingFetch>,
    next_ticket: u64,
    next_answer_seq: u64,
}

impl Room {
    /// Creates an empty room in `LOBBY`. The host joins like anyone else.
    pub fn new(code: RoomCode, host_id: PlayerId, limits: RoomConfig) -> Self {
        Self {
            code,
            host_id,
            status: GameStatus::Lobby,
            players: BTreeMap::new(),
            teams: BTreeMap::new(),
            questions: Vec::new(),
            current_question_index: 0,
            current_question_ends_at: 0,
            round_number: 1,
            config: GameConfig::default(),
            limits,
            fetch: None,
            next_ticket: 0,
            next_answer_seq: 0,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    pub fn teams(&self) -> &BTreeMap<TeamId, Team> {
        &self.teams
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The question at the current index, if the round has one.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// Whether a fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The sanitized projection sent with every `state_update`.
    pub fn view(&self) -> RoomView {
        sanitize::project(self)
    }

    /// This room's lobby directory row, if it is in a joinable phase.
    pub fn lobby_entry(&self) -> Option<LobbyEntry> {
        self.status
            .is_listed()
            .then(|| sanitize::lobby_entry(self))
    }

    // -- membership ---------------------------------------------------------

    /// Adds a player, or renames them if they are already a member.
    pub fn join(&mut self, player_id: PlayerId, name: &str) -> Result<Vec<Effect>, RoomError> {
        let name = self.clean_player_name(player_id, name);

        if let Some(player) = self.players.get_mut(&player_id) {
            debug!(room = %self.code, %player_id, %name, "player renamed");
            player.name = name;
            return Ok(vec![Effect::Broadcast]);
        }

        if self.players.len() >= self.limits.max_players {
            return Err(RoomError::Full(self.code.clone()));
        }

        let is_host = player_id == self.host_id;
        self.players.insert(
            player_id,
            Player {
                id: player_id,
                name,
                team_id: None,
                is_host,
            },
        );
        info!(
            room = %self.code,
            %player_id,
            is_host,
            players = self.players.len(),
            "player joined"
        );
        Ok(vec![Effect::Broadcast])
    }

    /// Removes a player. The host id is never reassigned.
    pub fn leave(&mut self, player_id: PlayerId) -> Vec<Effect> {
        if !self.remove_player(player_id) {
            return Vec::new();
        }
        info!(room = %self.code, %player_id, players = self.players.len(), "player left");
        if self.players.is_empty() {
            Vec::new()
        } else {
            vec![Effect::Broadcast]
        }
    }

    /// Dispatches a member's action.
    pub fn act(&mut self, player_id: PlayerId, action: PlayerAction, now_ms: u64) -> Vec<Effect> {
        if !self.players.contains_key(&player_id) {
            debug!(room = %self.code, %player_id, "action from non-member, ignoring");
            return Vec::new();
        }
        match action {
            PlayerAction::CreateTeam { name } => self.create_team(player_id, &name),
            PlayerAction::JoinTeam { team_id } => self.join_team(player_id, team_id),
            PlayerAction::SubmitAnswer { answer_id } => {
                self.submit_answer(player_id, answer_id, now_ms)
            }
            PlayerAction::Host(action) => self.host_action(player_id, action, now_ms),
        }
    }

    fn create_team(&mut self, player_id: PlayerId, name: &str) -> Vec<Effect> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > self.limits.max_team_name_len {
            debug!(room = %self.code, %player_id, "invalid team name");
            return Vec::new();
        }
        let lowered = name.to_lowercase();
        if self.teams.values().any(|t| t.name.to_lowercase() == lowered) {
            debug!(room = %self.code, %player_id, team = name, "team name taken");
            return Vec::new();
        }

        let team = Team::new(name.to_string());
        let team_id = team.id;
        self.teams.insert(team_id, team);
        info!(room = %self.code, %team_id, team = name, "team created");

        self.move_to_team(player_id, team_id);
        vec![Effect::Broadcast]
    }

    fn join_team(&mut self, player_id: PlayerId, team_id: TeamId) -> Vec<Effect> {
        if !self.teams.contains_key(&team_id) {
            debug!(room = %self.code, %player_id, %team_id, "no such team");
            return Vec::new();
        }
        if self.team_of(player_id) == Some(team_id) {
            return Vec::new();
        }
        self.move_to_team(player_id, team_id);
        vec![Effect::Broadcast]
    }

    fn submit_answer(&mut self, player_id: PlayerId, answer_id: AnswerId, now_ms: u64) -> Vec<Effect> {
        if self.status != GameStatus::Question {
            debug!(room = %self.code, %player_id, status = %self.status, "answer outside question");
            return Vec::new();
        }
        let Some(team_id) = self.team_of(player_id) else {
            debug!(room = %self.code, %player_id, "answer from player without team");
            return Vec::new();
        };
        if !self
            .current_question()
            .is_some_and(|q| q.has_answer(answer_id))
        {
            debug!(room = %self.code, %player_id, %answer_id, "answer is not an option");
            return Vec::new();
        }

        let started_at = self
            .current_question_ends_at
            .saturating_sub(self.config.question_duration_ms());
        self.next_answer_seq += 1;
        let seq = self.next_answer_seq;

        let Some(team) = self.teams.get_mut(&team_id) else {
            return Vec::new();
        };
        team.current_answer_id = Some(answer_id);
        team.last_answer_time = now_ms.saturating_sub(started_at);
        team.last_answered_by = Some(player_id);
        team.answer_seq = seq;
        debug!(
            room = %self.code,
            %player_id,
            %team_id,
            elapsed_ms = team.last_answer_time,
            "answer recorded"
        );
        vec![Effect::Broadcast]
    }

    // -- host actions -------------------------------------------------------

    fn host_action(&mut self, player_id: PlayerId, action: HostAction, now_ms: u64) -> Vec<Effect> {
        if player_id != self.host_id {
            debug!(room = %self.code, %player_id, action = ?action.kind(), "host action from non-host");
            return Vec::new();
        }
        match action {
            HostAction::StartGame(config) => self.start_game(config),
            HostAction::NextQuestion => self.next_question(now_ms),
            HostAction::Reveal => self.reveal(),
            HostAction::NextRound => self.next_round(),
            HostAction::EndGame => self.end_game(),
            HostAction::KickPlayer { player_id: target } => self.kick(target),
        }
    }

    fn start_game(&mut self, config: GameConfig) -> Vec<Effect> {
        if self.status != GameStatus::Lobby || self.fetch.is_some() {
            debug!(room = %self.code, status = %self.status, "START_GAME rejected");
            return Vec::new();
        }
        self.config = config.validated();
        self.round_number = 1;
        self.set_status(GameStatus::Loading);

        let fetch = self.begin_fetch(FetchPurpose::StartGame);
        vec![Effect::Broadcast, fetch]
    }

    fn next_question(&mut self, now_ms: u64) -> Vec<Effect> {
        match self.status {
            GameStatus::LobbyReady => self.start_question(now_ms),
            GameStatus::Reveal => {
                if self.current_question_index + 1 < self.questions.len() {
                    self.current_question_index += 1;
                    self.start_question(now_ms)
                } else {
                    self.set_status(GameStatus::RoundEnd);
                    vec![Effect::Broadcast]
                }
            }
            _ => {
                debug!(room = %self.code, status = %self.status, "NEXT_QUESTION rejected");
                Vec::new()
            }
        }
    }

    fn start_question(&mut self, now_ms: u64) -> Vec<Effect> {
        self.set_status(GameStatus::Question);
        self.current_question_ends_at = now_ms + self.config.question_duration_ms();
        for team in self.teams.values_mut() {
            team.clear_answer();
        }
        vec![
            Effect::ArmDeadline(self.config.question_duration()),
            Effect::Broadcast,
        ]
    }

    /// Closes the open question and scores it.
    ///
    /// Called for the host's REVEAL and when the deadline fires. A no-op
    /// unless the room is in `QUESTION`, so a late deadline after a forced
    /// reveal scores nothing twice.
    pub fn reveal(&mut self) -> Vec<Effect> {
        if self.status != GameStatus::Question {
            debug!(room = %self.code, status = %self.status, "reveal ignored");
            return Vec::new();
        }

        let deltas = scoring::score(self.current_question(), self.teams.values());
        for delta in &deltas {
            if let Some(team) = self.teams.get_mut(&delta.team_id) {
                team.score += delta.points;
            }
            if delta.points > 0 {
                debug!(
                    room = %self.code,
                    team_id = %delta.team_id,
                    points = delta.points,
                    bonus = delta.bonus,
                    "team scored"
                );
            }
        }
        info!(
            room = %self.code,
            question = self.current_question_index,
            correct_teams = deltas.iter().filter(|d| d.correct).count(),
            "question revealed"
        );

        self.set_status(GameStatus::Reveal);
        vec![Effect::CancelDeadline, Effect::Broadcast]
    }

    fn next_round(&mut self) -> Vec<Effect> {
        if self.status != GameStatus::RoundEnd || self.fetch.is_some() {
            debug!(room = %self.code, status = %self.status, "NEXT_ROUND rejected");
            return Vec::new();
        }
        let purpose = FetchPurpose::NextRound {
            prev_index: self.current_question_index,
            prev_round: self.round_number,
        };
        self.set_status(GameStatus::Loading);
        self.current_question_index = 0;
        self.round_number += 1;

        let fetch = self.begin_fetch(purpose);
        vec![Effect::CancelDeadline, Effect::Broadcast, fetch]
    }

    fn end_game(&mut self) -> Vec<Effect> {
        if self.status == GameStatus::Finished {
            return Vec::new();
        }
        if let Some(pending) = self.fetch.take() {
            debug!(room = %self.code, ticket = pending.ticket, "abandoning fetch");
        }
        self.set_status(GameStatus::Finished);
        vec![Effect::CancelDeadline, Effect::Broadcast]
    }

    fn kick(&mut self, target: PlayerId) -> Vec<Effect> {
        if target == self.host_id {
            debug!(room = %self.code, "host cannot kick themselves");
            return Vec::new();
        }
        if !self.remove_player(target) {
            debug!(room = %self.code, %target, "kick target not in room");
            return Vec::new();
        }
        info!(room = %self.code, player_id = %target, "player kicked");

        let mut effects = vec![Effect::Send(target, ServerEvent::Kicked), Effect::Evict(target)];
        if !self.players.is_empty() {
            effects.push(Effect::Broadcast);
        }
        effects
    }

    // -- fetch lifecycle ----------------------------------------------------

    fn begin_fetch(&mut self, purpose: FetchPurpose) -> Effect {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.fetch = Some(PendingFetch { ticket, purpose });
        info!(room = %self.code, ticket, round = self.round_number, "fetching questions");
        Effect::Fetch {
            ticket,
            request: QuestionRequest::from(&self.config),
        }
    }

    /// Applies the outcome of the fetch started with `ticket`.
    ///
    /// Completions for a fetch that was abandoned (game ended) or
    /// superseded are discarded. An empty list counts as a failure.
    pub fn fetch_completed(
        &mut self,
        ticket: u64,
        result: Result<Vec<Question>, SupplyError>,
    ) -> Vec<Effect> {
        let pending = match self.fetch {
            Some(pending) if pending.ticket == ticket => pending,
            _ => {
                debug!(room = %self.code, ticket, "stale fetch result discarded");
                return Vec::new();
            }
        };
        self.fetch = None;

        match result {
            Ok(questions) if !questions.is_empty() => {
                info!(room = %self.code, count = questions.len(), "questions loaded");
                self.questions = questions;
                self.current_question_index = 0;
                for team in self.teams.values_mut() {
                    team.clear_answer();
                }
                self.set_status(GameStatus::LobbyReady);
            }
            Ok(_) => self.fetch_failed(pending.purpose, &SupplyError::Empty),
            Err(error) => self.fetch_failed(pending.purpose, &error),
        }
        vec![Effect::Broadcast]
    }

    fn fetch_failed(&mut self, purpose: FetchPurpose, error: &SupplyError) {
        warn!(room = %self.code, %error, "question fetch failed");
        match purpose {
            FetchPurpose::StartGame => self.set_status(GameStatus::Lobby),
            FetchPurpose::NextRound {
                prev_index,
                prev_round,
            } => {
                self.current_question_index = prev_index;
                self.round_number = prev_round;
                self.set_status(GameStatus::RoundEnd);
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            info!(room = %self.code, from = %self.status, to = %status, "status changed");
            self.status = status;
        }
    }

    fn clean_player_name(&self, player_id: PlayerId, raw: &str) -> String {
        let name: String = raw.trim().chars().take(self.limits.max_name_len).collect();
        let name = name.trim_end().to_string();
        if name.is_empty() {
            format!("Player {}", player_id.0)
        } else {
            name
        }
    }

    fn team_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.players.get(&player_id).and_then(|p| p.team_id)
    }

    fn move_to_team(&mut self, player_id: PlayerId, team_id: TeamId) {
        self.detach_from_team(player_id);
        if let Some(team) = self.teams.get_mut(&team_id) {
            team.members.insert(player_id);
        }
        if let Some(player) = self.players.get_mut(&player_id) {
            player.team_id = Some(team_id);
        }
    }

    /// Removes the player from their team, deleting the team if it empties.
    fn detach_from_team(&mut self, player_id: PlayerId) {
        let Some(team_id) = self
            .players
            .get_mut(&player_id)
            .and_then(|p| p.team_id.take())
        else {
            return;
        };
        let now_empty = match self.teams.get_mut(&team_id) {
            Some(team) => {
                team.members.remove(&player_id);
                team.members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.teams.remove(&team_id);
            info!(room = %self.code, %team_id, "empty team removed");
        }
    }

    fn remove_player(&mut self, player_id: PlayerId) -> bool {
        if !self.players.contains_key(&player_id) {
            return false;
        }
        self.detach_from_team(player_id);
        self.players.remove(&player_id);
        true
    }
}
