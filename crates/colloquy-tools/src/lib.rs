pub mod error;
pub mod result;
pub mod schema;
pub mod tools;

pub use error::ToolError;
pub use result::{ToolOutcome, ToolOutput};
pub use schema::{InputSchema, ToolDeclaration, ToolSpec};
pub use tools::{RecognizedTool, catalog};
