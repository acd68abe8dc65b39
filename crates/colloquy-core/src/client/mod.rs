pub mod loopback;
pub mod subscription;

pub use loopback::LoopbackClient;
pub use subscription::{EventHub, EventSubscription};

use async_trait::async_trait;
use strum::Display;

use crate::config::SessionConfig;
use crate::live::{Part, ToolResponseBatch};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Link state as observed from outside the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Capabilities the core needs from a live session client.
///
/// The client owns the transport and connection lifecycle. Events are
/// delivered to every live [`EventSubscription`]; dropping a subscription
/// unsubscribes it.
#[async_trait]
pub trait SessionClient: Send + Sync + 'static {
    /// Sets the configuration used by the next `connect`.
    fn configure(&self, config: SessionConfig);

    async fn connect(&self, config: SessionConfig) -> Result<(), ClientError>;

    fn send(&self, parts: Vec<Part>) -> Result<(), ClientError>;

    fn send_tool_response(&self, batch: ToolResponseBatch) -> Result<(), ClientError>;

    fn subscribe(&self) -> EventSubscription;

    fn is_connected(&self) -> bool;
}
