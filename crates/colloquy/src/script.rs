//! Session scripts.
//!
//! A script is JSON lines. Each line is either a server frame in live wire
//! format, or one of the driver steps `{"user": "..."}`, `{"open_panel": true}`,
//! `{"wait_ms": 250}` and `{"disconnect": "reason"}`. Blank lines and lines
//! starting with `#` are skipped.

use colloquy_core::live::ServerMessage;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    User { user: String },
    OpenPanel { open_panel: bool },
    Wait { wait_ms: u64 },
    Disconnect { disconnect: String },
    Server(ServerMessage),
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Line {line}: not a script step: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub fn parse_script(contents: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| {
            serde_json::from_str(text).map_err(|source| ScriptError::Parse { line, source })
        })
        .collect()
}
