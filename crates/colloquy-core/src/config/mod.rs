pub mod session;
pub mod settings;

pub use session::{
    Capabilities, GenerationConfig, PrebuiltVoiceConfig, ResponseModality, SessionConfig,
    SessionConfigBuilder, SpeechConfig, ToolEntry, VoiceConfig,
};
pub use settings::Settings;
