use super::Command;
use async_trait::async_trait;
use eyre::Result;
use std::io::Write;

/// Prints the function declarations sent in a graph session's setup.
pub struct ToolsCommand;

impl ToolsCommand {
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        let catalog = colloquy_core::mediator::configure_tools();
        writeln!(out, "{}", serde_json::to_string_pretty(&catalog)?)?;
        Ok(())
    }
}

#[async_trait]
impl Command for ToolsCommand {
    async fn execute(&self) -> Result<()> {
        self.write_to(&mut std::io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn prints_render_altair_declaration() {
        let mut out = Vec::new();
        ToolsCommand.write_to(&mut out).unwrap();

        let catalog: Value = serde_json::from_slice(&out).unwrap();
        let declarations = catalog.as_array().unwrap();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0]["name"], "render_altair");
        assert_eq!(
            declarations[0]["parameters"]["properties"]["json_graph"]["type"],
            "string"
        );
        assert_eq!(
            declarations[0]["parameters"]["required"],
            serde_json::json!(["json_graph"])
        );
    }
}
