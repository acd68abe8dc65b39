use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// One piece of a turn. Parts without `text` (audio, images) are carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Text of this part, if it carries any.
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Text parts joined in arrival order with no separator.
    pub fn joined_text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

/// Streamed server content.
///
/// Only [`ServerContent::ModelTurn`] carries conversational text; the other
/// variants are turn-management signals. Frames of any other shape decode as
/// [`ServerContent::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerContent {
    ModelTurn {
        #[serde(rename = "modelTurn")]
        model_turn: Content,
    },
    TurnComplete {
        #[serde(rename = "turnComplete")]
        turn_complete: bool,
    },
    Interrupted {
        interrupted: bool,
    },
    Other(Map<String, Value>),
}

impl ServerContent {
    pub fn model_turn(&self) -> Option<&Content> {
        match self {
            ServerContent::ModelTurn { model_turn } => Some(model_turn),
            ServerContent::TurnComplete { .. }
            | ServerContent::Interrupted { .. }
            | ServerContent::Other(_) => None,
        }
    }

    pub fn is_model_turn(&self) -> bool {
        self.model_turn().is_some()
    }
}
