use serde::{Deserialize, Serialize};

/// Structured outcome returned to the model for a single tool call.
///
/// Serializes as `{"output": {"success": true}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub output: ToolOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
}

impl ToolOutcome {
    pub fn success() -> Self {
        Self {
            output: ToolOutput { success: true },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ToolOutcome;

    #[test]
    fn success_outcome_wire_shape() {
        let value = serde_json::to_value(ToolOutcome::success()).unwrap();
        assert_eq!(value, serde_json::json!({ "output": { "success": true } }));
    }
}
