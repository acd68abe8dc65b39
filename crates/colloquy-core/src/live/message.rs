use serde::{Deserialize, Serialize};

use super::content::{Content, ServerContent};
use super::event::ClientEvent;
use super::tool_call::{ToolCallCancellation, ToolInvocationBatch, ToolResponseBatch};
use crate::config::SessionConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupComplete {}

/// One frame received from the live endpoint. Each frame carries exactly one
/// top-level key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerMessage {
    SetupComplete(SetupComplete),
    ServerContent(ServerContent),
    ToolCall(ToolInvocationBatch),
    ToolCallCancellation(ToolCallCancellation),
}

impl ServerMessage {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn into_event(self) -> ClientEvent {
        match self {
            ServerMessage::SetupComplete(_) => ClientEvent::SetupComplete,
            ServerMessage::ServerContent(content) => ClientEvent::Content(content),
            ServerMessage::ToolCall(batch) => ClientEvent::ToolCall(batch),
            ServerMessage::ToolCallCancellation(cancellation) => {
                ClientEvent::ToolCallCancellation(cancellation)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

/// One frame sent to the live endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(SessionConfig),
    ClientContent(ClientContent),
    ToolResponse(ToolResponseBatch),
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn tool_response(&self) -> Option<&ToolResponseBatch> {
        match self {
            ClientMessage::ToolResponse(batch) => Some(batch),
            ClientMessage::Setup(_) | ClientMessage::ClientContent(_) => None,
        }
    }

    pub fn client_content(&self) -> Option<&ClientContent> {
        match self {
            ClientMessage::ClientContent(content) => Some(content),
            ClientMessage::Setup(_) | ClientMessage::ToolResponse(_) => None,
        }
    }
}
