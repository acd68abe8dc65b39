//! Tool-call mediation.
//!
//! The mediator declares the tool catalog, reacts to tool-call batches from
//! the session client, keeps the current graph and acknowledges every call
//! after a short delay. Rendering runs as a separate step that draws every
//! change of the current graph in order.

pub mod actor;
pub mod dispatch;
pub mod render;

pub use actor::{MediatorHandle, ToolCallMediator};
pub use dispatch::{BatchPlan, GraphPayload, ToolAction, acknowledge, plan_batch};
pub use render::{GraphSlot, RenderAnchor, RenderError, RenderOutcome, RenderSink, render_graph};

use colloquy_tools::{ToolDeclaration, ToolError};

/// The catalog declared to the model when a graph session is configured.
pub fn configure_tools() -> Vec<ToolDeclaration> {
    colloquy_tools::catalog()
}

/// Internal outcomes of mediation, separate from what is acknowledged
/// upstream. Acknowledgments always report success; these do not.
#[derive(Debug, Clone, PartialEq)]
pub enum MediatorSignal {
    GraphUpdated { call_id: String },
    ExtractionFailed { call_id: String, error: ToolError },
    Rendered { anchor: RenderAnchor },
    RenderFailed { error: RenderError },
    Acknowledged { ids: Vec<String> },
    AcknowledgmentWithdrawn { ids: Vec<String> },
    AcknowledgmentFailed { ids: Vec<String>, error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    #[error("Mediator is no longer running")]
    ChannelClosed,
}
