use serde::{Deserialize, Serialize};
use strum::Display;

use super::TranscriptError;
use crate::live::ServerContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Speaker {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub speaker: Speaker,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: Speaker::User,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: Speaker::Model,
        }
    }
}

/// User input with at least one non-whitespace character. The text itself is
/// kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserText(String);

impl UserText {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Concatenated text of a model-turn event, or `None` for turn-management
/// events and model turns without text.
pub fn model_turn_text(content: &ServerContent) -> Option<String> {
    let text = content.model_turn()?.joined_text();
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user entry. Returns the new entry's index.
    pub fn submit_user(&mut self, text: &UserText) -> usize {
        self.push(TranscriptEntry::user(text.as_str()))
    }

    /// Validates and appends raw user input.
    pub fn submit_user_text(&mut self, text: &str) -> Result<usize, TranscriptError> {
        let text = UserText::new(text).ok_or(TranscriptError::EmptyInput)?;
        Ok(self.submit_user(&text))
    }

    /// Appends one model entry if `content` is a model turn with text.
    pub fn apply_content(&mut self, content: &ServerContent) -> Option<usize> {
        model_turn_text(content).map(|text| self.push(TranscriptEntry::model(text)))
    }

    fn push(&mut self, entry: TranscriptEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TranscriptEntry> {
        self.entries.get(index)
    }

    pub fn latest_index(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
