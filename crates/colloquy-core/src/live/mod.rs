//! Wire types for the live session protocol.
//!
//! Field names follow the live API's camelCase JSON. Server frames decode
//! through [`ServerMessage`] and are fanned out to subscribers as
//! [`ClientEvent`]s; everything the core sends upstream is a [`ClientMessage`].

pub mod content;
pub mod event;
pub mod message;
pub mod tool_call;

pub use content::{Blob, Content, Part, ServerContent};
pub use event::ClientEvent;
pub use message::{ClientContent, ClientMessage, ServerMessage, SetupComplete};
pub use tool_call::{
    ToolCallCancellation, ToolInvocation, ToolInvocationBatch, ToolResponse, ToolResponseBatch,
};
