//! `HivequizServer` builder and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use hivequiz_protocol::{Codec, JsonCodec};
use hivequiz_questions::QuestionSource;
use hivequiz_room::{RoomConfig, RoomManager};
use hivequiz_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::HivequizError;
use crate::handler::handle_connection;

/// Address used when the builder is not given one.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<Q, C> {
    pub(crate) rooms: Mutex<RoomManager<Q>>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Hivequiz server.
pub struct HivequizServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl HivequizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the limits applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and prepares the server.
    ///
    /// Every room fetches its questions from `source`.
    pub async fn build<Q: QuestionSource>(
        self,
        source: Q,
    ) -> Result<HivequizServer<Q>, HivequizError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(Arc::new(source), self.room_config)),
            codec: JsonCodec,
        });

        Ok(HivequizServer { transport, state })
    }
}

impl Default for HivequizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Hivequiz server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HivequizServer<Q, C = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<Q, C>>,
}

impl HivequizServer<()> {
    /// Creates a new builder.
    pub fn builder() -> HivequizServerBuilder {
        HivequizServerBuilder::new()
    }
}

impl<Q, C> HivequizServer<Q, C>
where
    Q: QuestionSource,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, HivequizError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), HivequizError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Hivequiz server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
