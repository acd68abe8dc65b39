use colloquy_tools::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "args")]
    pub arguments: serde_json::Map<String, Value>,
}

/// All function calls the model issued in one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationBatch {
    #[serde(default, rename = "functionCalls")]
    pub invocations: Vec<ToolInvocation>,
}

impl ToolInvocationBatch {
    pub fn new(invocations: Vec<ToolInvocation>) -> Self {
        Self { invocations }
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.invocations.iter().map(|i| i.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallCancellation {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: String,
    #[serde(rename = "response")]
    pub result: ToolOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponseBatch {
    #[serde(rename = "functionResponses")]
    pub responses: Vec<ToolResponse>,
}

impl ToolResponseBatch {
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|r| r.id.as_str())
    }

    /// Drops responses for the given ids; returns how many were removed.
    pub fn withdraw(&mut self, ids: &[String]) -> usize {
        let before = self.responses.len();
        self.responses.retain(|r| !ids.contains(&r.id));
        before - self.responses.len()
    }
}
