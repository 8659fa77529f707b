//! Per-connection handler: welcome, event dispatch, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Send `welcome` with the connection's player id
//!   2. Loop: select between inbound frames and the outbound channel that
//!      rooms push `state_update` / `kicked` events into
//!   3. On close, leave the current room (the guard does this)

use std::sync::Arc;

use hivequiz_protocol::{ClientEvent, Codec, PlayerId, ServerEvent};
use hivequiz_questions::QuestionSource;
use hivequiz_room::{PlayerAction, PlayerSender, RoomError};
use hivequiz_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::HivequizError;
use crate::server::ServerState;

/// Drop guard that removes the player from their room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs on a spawned task.
struct MembershipGuard<Q: QuestionSource, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<Q, C>>,
}

impl<Q: QuestionSource, C: Codec> Drop for MembershipGuard<Q, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave_room(player_id).await {
                Ok(code) => tracing::info!(%player_id, room = %code, "left room on disconnect"),
                Err(RoomError::NotInRoom(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "disconnect cleanup failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<Q, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<Q, C>>,
) -> Result<(), HivequizError>
where
    Q: QuestionSource,
    C: Codec,
{
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(conn_id = %conn.id(), %player_id, "handling new connection");

    send(&conn, &state.codec, &ServerEvent::Welcome { player_id }).await?;

    let _guard = MembershipGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // Rooms hold a clone of `out_tx`, so `out_rx` never closes while the
    // handler runs.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEvent>();

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };

                match state.codec.decode::<ClientEvent>(&data) {
                    Ok(event) => dispatch(&state, player_id, &out_tx, event).await,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode event");
                        let _ = out_tx.send(ServerEvent::error(format!("invalid event: {e}")));
                    }
                }
            }
            Some(event) = out_rx.recv() => {
                send(&conn, &state.codec, &event).await?;
            }
        }
    }

    // _guard drops here → room cleanup fires.
    Ok(())
}

/// Routes one decoded event to the room layer.
///
/// Replies meant only for this caller go through `out_tx` so they stay
/// ordered with room broadcasts.
async fn dispatch<Q, C>(
    state: &ServerState<Q, C>,
    player_id: PlayerId,
    out_tx: &PlayerSender,
    event: ClientEvent,
) where
    Q: QuestionSource,
    C: Codec,
{
    match event {
        ClientEvent::CreateRoom { host_name } => {
            let result = state
                .rooms
                .lock()
                .await
                .create_room(player_id, &host_name, out_tx.clone())
                .await;
            if let Err(e) = result {
                reply_error(out_tx, player_id, &e);
            }
        }

        ClientEvent::JoinGame { room_code, name } => {
            let result = state
                .rooms
                .lock()
                .await
                .join_room(player_id, &room_code, &name, out_tx.clone())
                .await;
            if let Err(e) = result {
                reply_error(out_tx, player_id, &e);
            }
        }

        ClientEvent::CreateTeam {
            room_code,
            team_name,
        } => {
            act(state, player_id, &room_code, PlayerAction::CreateTeam { name: team_name }).await;
        }

        ClientEvent::JoinTeam { room_code, team_id } => {
            act(state, player_id, &room_code, PlayerAction::JoinTeam { team_id }).await;
        }

        ClientEvent::SubmitAnswer {
            room_code,
            answer_id,
        } => {
            act(state, player_id, &room_code, PlayerAction::SubmitAnswer { answer_id }).await;
        }

        ClientEvent::HostAction { room_code, action } => {
            act(state, player_id, &room_code, PlayerAction::Host(action)).await;
        }

        ClientEvent::ListLobbies(_) => {
            let entries = state.rooms.lock().await.list_lobbies().await;
            let _ = out_tx.send(ServerEvent::OpenLobbies(entries));
        }
    }
}

/// In-room actions against a missing room are dropped without a reply.
async fn act<Q, C>(
    state: &ServerState<Q, C>,
    player_id: PlayerId,
    room_code: &hivequiz_protocol::RoomCode,
    action: PlayerAction,
) where
    Q: QuestionSource,
{
    let result = state
        .rooms
        .lock()
        .await
        .act(player_id, room_code, action)
        .await;
    if let Err(e) = result {
        tracing::debug!(%player_id, room = %room_code, error = %e, "action dropped");
    }
}

fn reply_error(out_tx: &PlayerSender, player_id: PlayerId, error: &RoomError) {
    tracing::debug!(%player_id, %error, "request failed");
    let _ = out_tx.send(ServerEvent::error(error.user_message()));
}

/// Encodes and writes one event straight to the connection.
async fn send<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    event: &ServerEvent,
) -> Result<(), HivequizError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}
