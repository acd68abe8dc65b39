pub mod render_altair;

pub use render_altair::{RENDER_ALTAIR_TOOL_NAME, RenderAltairParams, RenderAltairToolSpec};

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::schema::{ToolDeclaration, ToolSpec};

/// Tool names this client knows how to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RecognizedTool {
    RenderAltair,
}

impl RecognizedTool {
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn declaration(self) -> ToolDeclaration {
        match self {
            RecognizedTool::RenderAltair => RenderAltairToolSpec::declaration(),
        }
    }
}

/// The fixed catalog of tools declared to the model at session setup.
pub fn catalog() -> Vec<ToolDeclaration> {
    RecognizedTool::iter().map(RecognizedTool::declaration).collect()
}
