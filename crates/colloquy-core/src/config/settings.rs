use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::session::{Capabilities, DEFAULT_MODEL, DEFAULT_VOICE, SessionConfig};
use crate::error::{Error, Result};

const DEFAULT_ACK_DELAY_MS: u64 = 200;
const DEFAULT_CHAT_INSTRUCTION: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    /// Delay before tool calls are acknowledged to the model.
    #[serde(default = "default_ack_delay_ms")]
    pub ack_delay_ms: u64,

    /// Declare search grounding alongside the tool catalog.
    #[serde(default = "default_search_grounding")]
    pub search_grounding: bool,

    #[serde(default)]
    pub instructions: InstructionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionSettings {
    pub graph: Option<String>,
    #[serde(default = "default_chat_instruction")]
    pub chat: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_ack_delay_ms() -> u64 {
    DEFAULT_ACK_DELAY_MS
}

fn default_search_grounding() -> bool {
    true
}

fn default_chat_instruction() -> String {
    DEFAULT_CHAT_INSTRUCTION.to_string()
}

impl Default for InstructionSettings {
    fn default() -> Self {
        Self {
            graph: None,
            chat: default_chat_instruction(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: default_model(),
            voice: default_voice(),
            ack_delay_ms: default_ack_delay_ms(),
            search_grounding: default_search_grounding(),
            instructions: InstructionSettings::default(),
        }
    }
}

impl Settings {
    /// Get the path to the default settings file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("colloquy").join("settings.toml"))
    }

    /// Load settings from `path`, or the default location when `None`.
    /// A missing file yields defaults; an unparsable one logs and yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        match toml::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    pub fn ack_delay(&self) -> Duration {
        Duration::from_millis(self.ack_delay_ms)
    }

    /// Configuration for sessions that may render graphs.
    pub fn graph_session(&self) -> SessionConfig {
        let capabilities = Capabilities {
            search: self.search_grounding,
            ..Capabilities::graph_rendering()
        };
        SessionConfig::builder(capabilities)
            .model(&self.model)
            .voice(&self.voice)
            .system_instruction(self.instructions.graph.clone())
            .build()
    }

    /// Configuration used when the chat panel opens a connection.
    pub fn chat_session(&self) -> SessionConfig {
        SessionConfig::builder(Capabilities::plain_chat())
            .model(&self.model)
            .system_instruction(Some(self.instructions.chat.clone()))
            .build()
    }
}
