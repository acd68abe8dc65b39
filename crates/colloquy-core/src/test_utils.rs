//! Test utilities for colloquy-core
//!
//! Helpers shared by unit tests and the integration tests under `tests/`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::live::{Content, Part, ServerContent, ToolInvocation};
use crate::mediator::{RenderAnchor, RenderError, RenderSink};

/// Render sink that records what it was asked to draw.
#[derive(Default)]
pub struct RecordingSink {
    failure: Option<String>,
    embedded: Mutex<Vec<(RenderAnchor, Value)>>,
    errors: Mutex<Vec<(RenderAnchor, RenderError)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every `embed` fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn embedded(&self) -> Vec<(RenderAnchor, Value)> {
        lock(&self.embedded).clone()
    }

    pub fn errors(&self) -> Vec<(RenderAnchor, RenderError)> {
        lock(&self.errors).clone()
    }
}

impl RenderSink for RecordingSink {
    fn embed(&self, anchor: &RenderAnchor, document: &Value) -> Result<(), RenderError> {
        if let Some(message) = &self.failure {
            return Err(RenderError::Sink(message.clone()));
        }
        lock(&self.embedded).push((anchor.clone(), document.clone()));
        Ok(())
    }

    fn show_error(&self, anchor: &RenderAnchor, error: &RenderError) {
        lock(&self.errors).push((anchor.clone(), error.clone()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn invocation(id: &str, name: &str, args: Value) -> ToolInvocation {
    let arguments = match args {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

/// A `render_altair` call carrying `json_graph` verbatim.
pub fn graph_call(id: &str, json_graph: &str) -> ToolInvocation {
    invocation(
        id,
        "render_altair",
        serde_json::json!({ "json_graph": json_graph }),
    )
}

pub fn model_turn(texts: &[&str]) -> ServerContent {
    ServerContent::ModelTurn {
        model_turn: Content {
            role: Some("model".to_string()),
            parts: texts.iter().map(|t| Part::text(*t)).collect(),
        },
    }
}
