use super::content::ServerContent;
use super::tool_call::{ToolCallCancellation, ToolInvocationBatch};

/// Events a session client fans out to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Open,
    Close { reason: Option<String> },
    SetupComplete,
    Content(ServerContent),
    ToolCall(ToolInvocationBatch),
    ToolCallCancellation(ToolCallCancellation),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Open => "open",
            ClientEvent::Close { .. } => "close",
            ClientEvent::SetupComplete => "setupcomplete",
            ClientEvent::Content(_) => "content",
            ClientEvent::ToolCall(_) => "toolcall",
            ClientEvent::ToolCallCancellation(_) => "toolcallcancellation",
        }
    }
}
