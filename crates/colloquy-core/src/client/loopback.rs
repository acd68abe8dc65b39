use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ClientError, EventHub, EventSubscription, SessionClient};
use crate::config::SessionConfig;
use crate::live::{
    ClientContent, ClientEvent, ClientMessage, Content, Part, ServerMessage, ToolResponseBatch,
};

/// In-process session client.
///
/// Outbound frames are recorded instead of transmitted and server frames are
/// injected with [`LoopbackClient::deliver`]. Used for replaying scripted
/// sessions and in tests.
#[derive(Default)]
pub struct LoopbackClient {
    hub: EventHub,
    state: Mutex<LoopbackState>,
}

#[derive(Default)]
struct LoopbackState {
    connected: bool,
    configured: Option<SessionConfig>,
    connect_requests: Vec<SessionConfig>,
    outbound: Vec<ClientMessage>,
    connect_failure: Option<String>,
}

impl LoopbackClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Injects a server frame as if it arrived over the wire.
    pub fn deliver(&self, message: ServerMessage) -> usize {
        self.hub.emit(message.into_event())
    }

    pub fn emit(&self, event: ClientEvent) -> usize {
        self.hub.emit(event)
    }

    pub fn disconnect(&self, reason: Option<String>) {
        self.state().connected = false;
        self.hub.emit(ClientEvent::Close { reason });
    }

    /// Makes the next `connect` call fail with `message`.
    pub fn fail_next_connect(&self, message: impl Into<String>) {
        self.state().connect_failure = Some(message.into());
    }

    pub fn configured(&self) -> Option<SessionConfig> {
        self.state().configured.clone()
    }

    pub fn connect_requests(&self) -> Vec<SessionConfig> {
        self.state().connect_requests.clone()
    }

    pub fn outbound(&self) -> Vec<ClientMessage> {
        self.state().outbound.clone()
    }

    pub fn tool_responses(&self) -> Vec<ToolResponseBatch> {
        self.state()
            .outbound
            .iter()
            .filter_map(ClientMessage::tool_response)
            .cloned()
            .collect()
    }

    /// Text of every user turn sent so far.
    pub fn sent_texts(&self) -> Vec<String> {
        self.state()
            .outbound
            .iter()
            .filter_map(ClientMessage::client_content)
            .flat_map(|content| content.turns.iter().map(Content::joined_text))
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

#[async_trait]
impl SessionClient for LoopbackClient {
    fn configure(&self, config: SessionConfig) {
        self.state().configured = Some(config);
    }

    async fn connect(&self, config: SessionConfig) -> Result<(), ClientError> {
        {
            let mut state = self.state();
            state.connect_requests.push(config.clone());
            if let Some(message) = state.connect_failure.take() {
                return Err(ClientError::ConnectFailed(message));
            }
            state.connected = true;
            state.outbound.push(ClientMessage::Setup(config));
        }

        self.hub.emit(ClientEvent::Open);
        self.hub.emit(ClientEvent::SetupComplete);
        Ok(())
    }

    fn send(&self, parts: Vec<Part>) -> Result<(), ClientError> {
        self.state()
            .outbound
            .push(ClientMessage::ClientContent(ClientContent {
                turns: vec![Content::user(parts)],
                turn_complete: true,
            }));
        Ok(())
    }

    fn send_tool_response(&self, batch: ToolResponseBatch) -> Result<(), ClientError> {
        self.state().outbound.push(ClientMessage::ToolResponse(batch));
        Ok(())
    }

    fn subscribe(&self) -> EventSubscription {
        self.hub.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}
