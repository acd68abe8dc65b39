use colloquy_tools::ToolDeclaration;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::live::Content;

pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";
pub const DEFAULT_VOICE: &str = "Aoede";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseModality {
    Text,
    Audio,
}

/// What a session is allowed to do. Each entry point picks one of these
/// instead of spelling out its own configuration literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub modality: ResponseModality,
    pub function_tools: bool,
    pub search: bool,
}

impl Capabilities {
    /// Spoken responses with the tool catalog declared.
    pub fn graph_rendering() -> Self {
        Self {
            modality: ResponseModality::Audio,
            function_tools: true,
            search: true,
        }
    }

    /// Text-only chat without tools.
    pub fn plain_chat() -> Self {
        Self {
            modality: ResponseModality::Text,
            function_tools: false,
            search: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: ResponseModality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolEntry {
    GoogleSearch(GoogleSearch),
    FunctionDeclarations(Vec<ToolDeclaration>),
}

/// Session setup sent before a connection is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolEntry>,
}

impl SessionConfig {
    pub fn builder(capabilities: Capabilities) -> SessionConfigBuilder {
        SessionConfigBuilder::new(capabilities)
    }

    pub fn function_declarations(&self) -> &[ToolDeclaration] {
        self.tools
            .iter()
            .find_map(|entry| match entry {
                ToolEntry::FunctionDeclarations(declarations) => Some(declarations.as_slice()),
                ToolEntry::GoogleSearch(_) => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    capabilities: Capabilities,
    model: String,
    voice: String,
    system_instruction: Option<String>,
}

impl SessionConfigBuilder {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            system_instruction: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ignored unless the modality is audio.
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn build(self) -> SessionConfig {
        let Capabilities {
            modality,
            function_tools,
            search,
        } = self.capabilities;

        let speech_config = (modality == ResponseModality::Audio).then(|| SpeechConfig {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: self.voice,
                },
            },
        });

        let mut tools = Vec::new();
        if search {
            tools.push(ToolEntry::GoogleSearch(GoogleSearch {}));
        }
        if function_tools {
            tools.push(ToolEntry::FunctionDeclarations(colloquy_tools::catalog()));
        }

        SessionConfig {
            model: self.model,
            generation_config: GenerationConfig {
                response_modalities: modality,
                speech_config,
            },
            system_instruction: self.system_instruction.map(Content::instruction),
            tools,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graph_rendering_config_declares_tools_and_voice() {
        let config = SessionConfig::builder(Capabilities::graph_rendering())
            .system_instruction(Some("Render charts.".to_string()))
            .build();

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["generationConfig"]["responseModalities"], "audio");
        assert_eq!(
            value["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Aoede"
        );
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Render charts.");
        assert_eq!(value["tools"][0], json!({ "googleSearch": {} }));
        assert_eq!(
            value["tools"][1]["functionDeclarations"][0]["name"],
            "render_altair"
        );
        assert_eq!(config.function_declarations().len(), 1);
    }

    #[test]
    fn plain_chat_config_has_no_tools_or_voice() {
        let config = SessionConfig::builder(Capabilities::plain_chat())
            .system_instruction(Some("You are a helpful assistant.".to_string()))
            .build();

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["generationConfig"], json!({ "responseModalities": "text" }));
        assert!(value.get("tools").is_none());
        assert!(config.function_declarations().is_empty());
    }

    #[test]
    fn blank_instruction_is_omitted() {
        let config = SessionConfigBuilder::new(Capabilities::plain_chat())
            .system_instruction(Some("   ".to_string()))
            .build();
        assert!(config.system_instruction.is_none());
    }

    #[test]
    fn config_round_trips_through_setup_frame() {
        let config = SessionConfig::builder(Capabilities::graph_rendering())
            .model("models/custom")
            .voice("Puck")
            .build();
        let raw = serde_json::to_string(&config).unwrap();
        let decoded: SessionConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, config);
    }
}
