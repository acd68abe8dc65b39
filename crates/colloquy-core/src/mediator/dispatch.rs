//! Pure batch planning for the tool-call mediator.
//!
//! A batch is handled in two independent halves: at most one invocation (the
//! first with a recognized name) drives a local action, and every invocation
//! is acknowledged. Later invocations of a recognized tool in the same batch
//! are not acted on.

use std::collections::HashSet;
use std::fmt;

use colloquy_tools::tools::RenderAltairToolSpec;
use colloquy_tools::{RecognizedTool, ToolError, ToolOutcome, ToolSpec};

use crate::live::{ToolInvocation, ToolInvocationBatch, ToolResponse, ToolResponseBatch};

/// String-encoded graph specification, exactly as the model sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPayload(String);

impl GraphPayload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GraphPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local action selected for a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    RenderGraph {
        call_id: String,
        payload: GraphPayload,
    },
    /// A recognized call whose arguments could not be read.
    Rejected { call_id: String, error: ToolError },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub action: Option<ToolAction>,
    pub acknowledgment: Option<ToolResponseBatch>,
}

/// First invocation whose name is a recognized tool.
pub fn first_recognized(
    batch: &ToolInvocationBatch,
) -> Option<(RecognizedTool, &ToolInvocation)> {
    batch
        .invocations
        .iter()
        .find_map(|invocation| RecognizedTool::from_name(&invocation.name).map(|t| (t, invocation)))
}

pub fn action_for(tool: RecognizedTool, invocation: &ToolInvocation) -> ToolAction {
    let call_id = invocation.id.clone();
    match tool {
        RecognizedTool::RenderAltair => {
            match RenderAltairToolSpec::parse_params(&invocation.arguments) {
                Ok(params) => ToolAction::RenderGraph {
                    call_id,
                    payload: GraphPayload::new(params.json_graph),
                },
                Err(error) => ToolAction::Rejected { call_id, error },
            }
        }
    }
}

/// One success response per distinct invocation id, or `None` for an empty
/// batch. The outcome does not depend on whether the call was acted on.
pub fn acknowledge(batch: &ToolInvocationBatch) -> Option<ToolResponseBatch> {
    if batch.is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let responses = batch
        .ids()
        .filter(|id| seen.insert(*id))
        .map(|id| ToolResponse {
            id: id.to_string(),
            result: ToolOutcome::success(),
        })
        .collect();

    Some(ToolResponseBatch { responses })
}

pub fn plan_batch(batch: &ToolInvocationBatch) -> BatchPlan {
    BatchPlan {
        action: first_recognized(batch).map(|(tool, invocation)| action_for(tool, invocation)),
        acknowledgment: acknowledge(batch),
    }
}
