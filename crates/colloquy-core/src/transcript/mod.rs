//! Turn transcript accumulation.
//!
//! The transcript is an append-only log of user submissions and model turns.
//! Streamed model content is not merged: every model-turn event with text
//! becomes its own entry.

pub mod actor;
pub mod history;

pub use actor::{TranscriptAccumulator, TranscriptHandle};
pub use history::{Speaker, Transcript, TranscriptEntry, UserText, model_turn_text};

use crate::client::ConnectionState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("Transcript is no longer running")]
    ChannelClosed,
}

/// Published whenever the transcript grows or the observed link changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    /// `index` is always the newest entry; views scroll to it.
    Appended { index: usize, entry: TranscriptEntry },
    ConnectionChanged(ConnectionState),
}
