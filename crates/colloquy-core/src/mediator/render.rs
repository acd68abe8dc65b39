use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::MediatorSignal;
use super::dispatch::GraphPayload;

pub const DEFAULT_ANCHOR: &str = "vega-embed";

/// Stable identifier of the place a graph is drawn into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderAnchor(String);

impl RenderAnchor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RenderAnchor {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR)
    }
}

impl fmt::Display for RenderAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Malformed graph specification at line {line}, column {column}: {message}")]
    MalformedGraph {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Renderer failed: {0}")]
    Sink(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::MalformedGraph {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Visualization backend that draws a parsed graph specification.
pub trait RenderSink: Send + Sync {
    fn embed(&self, anchor: &RenderAnchor, document: &Value) -> Result<(), RenderError>;

    /// Replace whatever the anchor shows with an inline error.
    fn show_error(&self, anchor: &RenderAnchor, error: &RenderError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// Nothing to draw for an empty payload.
    Skipped,
}

/// Parses `payload` and hands the document to `sink`.
pub fn render_graph(
    payload: &GraphPayload,
    sink: &dyn RenderSink,
    anchor: &RenderAnchor,
) -> Result<RenderOutcome, RenderError> {
    if payload.is_empty() {
        return Ok(RenderOutcome::Skipped);
    }

    let document: Value = serde_json::from_str(payload.as_str())?;
    sink.embed(anchor, &document)?;
    Ok(RenderOutcome::Rendered)
}

/// Holder of the current graph. Last write wins.
#[derive(Debug)]
pub struct GraphSlot {
    tx: watch::Sender<Option<GraphPayload>>,
}

impl Default for GraphSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSlot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Stores `payload`; observers are only woken when the value changes.
    pub fn replace(&self, payload: GraphPayload) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&payload) {
                false
            } else {
                *current = Some(payload);
                true
            }
        })
    }

    pub fn current(&self) -> Option<GraphPayload> {
        self.tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<GraphPayload>> {
        self.tx.subscribe()
    }
}

/// Renders each changed graph in the order it was stored, until cancelled or
/// the mediator drops its sender. Failures are logged, shown inline and
/// signalled.
pub(crate) async fn run_renderer(
    mut changes: mpsc::UnboundedReceiver<GraphPayload>,
    sink: Arc<dyn RenderSink>,
    anchor: RenderAnchor,
    signals: broadcast::Sender<MediatorSignal>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            payload = changes.recv() => {
                let Some(payload) = payload else {
                    break;
                };

                match render_graph(&payload, sink.as_ref(), &anchor) {
                    Ok(RenderOutcome::Rendered) => {
                        tracing::debug!(anchor = %anchor, bytes = payload.as_str().len(), "Graph rendered");
                        let _ = signals.send(MediatorSignal::Rendered {
                            anchor: anchor.clone(),
                        });
                    }
                    Ok(RenderOutcome::Skipped) => {}
                    Err(error) => {
                        tracing::error!(anchor = %anchor, error = %error, "Failed to render graph");
                        sink.show_error(&anchor, &error);
                        let _ = signals.send(MediatorSignal::RenderFailed { error });
                    }
                }
            }
        }
    }

    tracing::debug!(anchor = %anchor, "Renderer stopped");
}
