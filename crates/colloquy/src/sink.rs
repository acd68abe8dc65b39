use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use colloquy_core::mediator::{RenderAnchor, RenderError, RenderSink};
use serde_json::Value;

/// Writes each rendered graph document, pretty-printed, to a text stream.
pub struct TerminalSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn out(&self) -> MutexGuard<'_, W> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn embed(&self, anchor: &RenderAnchor, document: &Value) -> Result<(), RenderError> {
        let pretty = serde_json::to_string_pretty(document)
            .map_err(|e| RenderError::Sink(e.to_string()))?;
        writeln!(self.out(), "[{anchor}] graph\n{pretty}")
            .map_err(|e| RenderError::Sink(e.to_string()))
    }

    fn show_error(&self, anchor: &RenderAnchor, error: &RenderError) {
        if let Err(e) = writeln!(self.out(), "[{anchor}] {error}") {
            tracing::warn!(anchor = %anchor, error = %e, "Failed to write render error");
        }
    }
}
