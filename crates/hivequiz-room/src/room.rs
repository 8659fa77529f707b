//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! The actor is the room's single point of serialization. Commands arrive
//! on a bounded mpsc channel and are applied one at a time, in order. Two
//! other event sources share the same `select!` loop:
//!
//! - the [`DeadlineTimer`], which auto-reveals an unattended question,
//! - completed question fetches, which run on their own tasks so a slow
//!   upstream never blocks the room.
//!
//! When the actor stops, its timer and any in-flight fetch result are
//! dropped with it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hivequiz_deadline::DeadlineTimer;
use hivequiz_protocol::{LobbyEntry, PlayerId, RoomCode, RoomView, ServerEvent};
use hivequiz_questions::{Question, QuestionRequest, QuestionSource, SupplyError};
use tokio::sync::{mpsc, oneshot};

use crate::{Effect, PlayerAction, Room, RoomConfig, RoomError};

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// What a membership-changing command did to the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomOutcome {
    /// Players the room removed (kicked) while handling the command.
    pub evicted: Vec<PlayerId>,
    /// Members left afterwards. Zero means the room should be deleted.
    pub remaining: usize,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<RoomOutcome>,
    },
    Act {
        player_id: PlayerId,
        action: PlayerAction,
        reply: oneshot::Sender<RoomOutcome>,
    },
    View {
        reply: oneshot::Sender<RoomView>,
    },
    Lobby {
        reply: oneshot::Sender<Option<LobbyEntry>>,
    },
    Shutdown,
}

/// A finished fetch, routed back into the actor loop.
struct FetchDone {
    ticket: u64,
    result: Result<Vec<Question>, SupplyError>,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The [`RoomManager`](crate::RoomManager) holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Adds a player, or renames them if already present.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join {
            player_id,
            name,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a player.
    pub async fn leave(&self, player_id: PlayerId) -> Result<RoomOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await
    }

    /// Applies a member's action and waits until it has been processed.
    pub async fn act(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<RoomOutcome, RoomError> {
        self.request(|reply| RoomCommand::Act {
            player_id,
            action,
            reply,
        })
        .await
    }

    /// The current sanitized view.
    pub async fn view(&self) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::View { reply }).await
    }

    /// The lobby directory row, if the room is in a joinable phase.
    pub async fn lobby_entry(&self) -> Result<Option<LobbyEntry>, RoomError> {
        self.request(|reply| RoomCommand::Lobby { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<Q> {
    room: Room,
    deadline: DeadlineTimer,
    senders: HashMap<PlayerId, PlayerSender>,
    source: Arc<Q>,
    receiver: mpsc::Receiver<RoomCommand>,
    fetch_tx: mpsc::UnboundedSender<FetchDone>,
    fetch_rx: mpsc::UnboundedReceiver<FetchDone>,
}

impl<Q: QuestionSource> RoomActor<Q> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(room = %self.room.code(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(done) = self.fetch_rx.recv() => {
                    let effects = self.room.fetch_completed(done.ticket, done.result);
                    self.apply(effects);
                }
                fired = self.deadline.wait() => {
                    tracing::debug!(
                        room = %self.room.code(),
                        generation = fired.generation,
                        late_ms = fired.late_by.as_millis() as u64,
                        "question deadline passed"
                    );
                    let effects = self.room.reveal();
                    self.apply(effects);
                }
            }
        }

        if self.deadline.cancel() {
            tracing::debug!(room = %self.room.code(), "pending deadline dropped with room");
        }
        let metrics = self.deadline.metrics();
        tracing::info!(
            room = %self.room.code(),
            deadlines_armed = metrics.armed,
            deadlines_fired = metrics.fired,
            deadlines_cancelled = metrics.cancelled,
            "room actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = match self.room.join(player_id, &name) {
                    Ok(effects) => {
                        self.senders.insert(player_id, sender);
                        self.apply(effects);
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                self.senders.remove(&player_id);
                let effects = self.room.leave(player_id);
                let outcome = self.apply(effects);
                let _ = reply.send(outcome);
            }
            RoomCommand::Act {
                player_id,
                action,
                reply,
            } => {
                let effects = self.room.act(player_id, action, now_ms());
                let outcome = self.apply(effects);
                let _ = reply.send(outcome);
            }
            RoomCommand::View { reply } => {
                let _ = reply.send(self.room.view());
            }
            RoomCommand::Lobby { reply } => {
                let _ = reply.send(self.room.lobby_entry());
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Carries out effects in order.
    fn apply(&mut self, effects: Vec<Effect>) -> RoomOutcome {
        let mut evicted = Vec::new();
        for effect in effects {
            match effect {
                Effect::Broadcast => {
                    let event = ServerEvent::StateUpdate(Box::new(self.room.view()));
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Effect::Send(player_id, event) => self.send_to(player_id, event),
                Effect::Evict(player_id) => {
                    self.senders.remove(&player_id);
                    evicted.push(player_id);
                }
                Effect::ArmDeadline(after) => {
                    self.deadline.arm(after);
                }
                Effect::CancelDeadline => {
                    let remaining = self.deadline.remaining();
                    if self.deadline.cancel() {
                        tracing::debug!(
                            room = %self.room.code(),
                            remaining_ms = remaining.map_or(0, |d| d.as_millis() as u64),
                            "deadline cancelled"
                        );
                    }
                }
                Effect::Fetch { ticket, request } => self.spawn_fetch(ticket, request),
            }
        }
        RoomOutcome {
            evicted,
            remaining: self.room.players().len(),
        }
    }

    fn spawn_fetch(&self, ticket: u64, request: QuestionRequest) {
        let source = Arc::clone(&self.source);
        let done_tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch(&request).await;
            // The room may be gone by now; that is fine.
            let _ = done_tx.send(FetchDone { ticket, result });
        });
    }

    /// Sends an event to a single player. Silently drops it if the
    /// player's connection is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Spawns a room actor and returns a handle to it.
pub(crate) fn spawn_room<Q: QuestionSource>(
    code: RoomCode,
    host_id: PlayerId,
    config: RoomConfig,
    source: Arc<Q>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

    let actor = RoomActor {
        room: Room::new(code.clone(), host_id, config),
        deadline: DeadlineTimer::new(),
        senders: HashMap::new(),
        source,
        receiver: rx,
        fetch_tx,
        fetch_rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
