//! Room store: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use hivequiz_protocol::{LobbyEntry, PlayerId, RoomCode};
use hivequiz_questions::QuestionSource;
use rand::Rng;

use crate::room::spawn_room;
use crate::{PlayerAction, PlayerSender, RoomConfig, RoomError, RoomHandle, RoomOutcome};

/// Characters used in generated room codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Attempts at finding an unused code before giving up.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from the connection
/// handlers. It is owned by the server and passed to handlers, never
/// reached through global state.
pub struct RoomManager<Q> {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,

    /// Shared by every room for question fetches.
    source: Arc<Q>,

    config: RoomConfig,
}

impl<Q: QuestionSource> RoomManager<Q> {
    /// Creates an empty store.
    pub fn new(source: Arc<Q>, config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            source,
            config,
        }
    }

    /// Creates a room with `host` as its host and joins them to it.
    ///
    /// If the host is in another room they leave it once the new room
    /// exists. On failure their current membership is untouched.
    pub async fn create_room(
        &mut self,
        host: PlayerId,
        host_name: &str,
        sender: PlayerSender,
    ) -> Result<RoomCode, RoomError> {
        let code = self.unused_code()?;
        let handle = spawn_room(
            code.clone(),
            host,
            self.config.clone(),
            Arc::clone(&self.source),
        );
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, %host, "room created");

        if let Err(e) = handle.join(host, host_name, sender).await {
            let _ = self.delete(&code).await;
            return Err(e);
        }
        self.leave_current(host).await;
        self.player_rooms.insert(host, code.clone());
        Ok(code)
    }

    /// Joins a player to an existing room.
    ///
    /// Joining the room you are already in renames you. Joining a different
    /// room leaves the current one, but only after the new room has
    /// accepted you; a rejected join (e.g. a full room) changes nothing.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let handle = self.get(code)?.clone();
        handle.join(player_id, name, sender).await?;

        if self.player_rooms.get(&player_id) != Some(code) {
            self.leave_current(player_id).await;
        }
        self.player_rooms.insert(player_id, code.clone());
        Ok(())
    }

    /// Removes a player from their current room, deleting the room if it
    /// empties. Returns the room they left.
    pub async fn leave_room(&mut self, player_id: PlayerId) -> Result<RoomCode, RoomError> {
        let code = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        if let Some(handle) = self.rooms.get(&code) {
            let outcome = handle.leave(player_id).await?;
            if outcome.remaining == 0 {
                self.delete(&code).await?;
            }
        }
        Ok(code)
    }

    /// Routes a member's action to the named room.
    pub async fn act(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        action: PlayerAction,
    ) -> Result<RoomOutcome, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let outcome = handle.act(player_id, action).await?;

        for evicted in &outcome.evicted {
            if self.player_rooms.get(evicted) == Some(code) {
                self.player_rooms.remove(evicted);
            }
        }
        if outcome.remaining == 0 {
            self.delete(code).await?;
        }
        Ok(outcome)
    }

    /// Returns a handle to a room.
    pub fn get(&self, code: &RoomCode) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Shuts down a room and removes all its players from the index.
    ///
    /// The room's pending deadline, if any, is dropped with its actor.
    pub async fn delete(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, c| c != code);

        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Rooms currently in a joinable phase, sorted by code.
    ///
    /// Queries each room actor. Rooms that fail to respond (e.g. shutting
    /// down) are skipped.
    pub async fn list_lobbies(&self) -> Vec<LobbyEntry> {
        let mut entries = Vec::new();
        for handle in self.rooms.values() {
            if let Ok(Some(entry)) = handle.lobby_entry().await {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        entries
    }

    /// Returns the room a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player_id)
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    async fn leave_current(&mut self, player_id: PlayerId) {
        if self.player_rooms.contains_key(&player_id) {
            if let Err(e) = self.leave_room(player_id).await {
                tracing::warn!(%player_id, error = %e, "failed to leave previous room");
            }
        }
    }

    fn unused_code(&self) -> Result<RoomCode, RoomError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(self.config.code_length);
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
            tracing::debug!(room = %code, "room code collision, regenerating");
        }
        Err(RoomError::InvalidState(
            "could not allocate a room code".to_string(),
        ))
    }
}

/// Generates a random upper-case alphanumeric room code.
pub fn generate_code(len: usize) -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_uppercase_alphanumeric() {
        for _ in 0..100 {
            let code = generate_code(4);
            assert_eq!(code.as_str().len(), 4);
            assert!(
                code.as_str()
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_code_length_is_configurable() {
        assert_eq!(generate_code(6).as_str().len(), 6);
    }
}
