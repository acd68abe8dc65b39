use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ToolSpec;

pub const RENDER_ALTAIR_TOOL_NAME: &str = "render_altair";

pub struct RenderAltairToolSpec;

impl ToolSpec for RenderAltairToolSpec {
    type Params = RenderAltairParams;

    const NAME: &'static str = RENDER_ALTAIR_TOOL_NAME;
    const DESCRIPTION: &'static str = "Displays an altair graph in json format.";
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderAltairParams {
    /// JSON STRING representation of the graph to render.
    pub json_graph: String,
}
