//! Server-side room limits.

/// Limits applied to every room. Game parameters chosen by the host live
/// in [`GameConfig`](hivequiz_protocol::GameConfig) instead.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Capacity of each room actor's command channel.
    pub channel_size: usize,

    /// Maximum players in one room. Joins beyond this get "Room is full".
    pub max_players: usize,

    /// Player names are truncated to this many characters.
    pub max_name_len: usize,

    /// Team names longer than this are rejected.
    pub max_team_name_len: usize,

    /// Characters in a generated room code.
    pub code_length: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            max_players: 100,
            max_name_len: 32,
            max_team_name_len: 32,
            code_length: 4,
        }
    }
}
