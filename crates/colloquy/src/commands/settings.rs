use super::Command;
use async_trait::async_trait;
use colloquy_core::config::Settings;
use eyre::Result;
use std::io::Write;
use std::path::PathBuf;

pub struct SettingsCommand {
    pub path: Option<PathBuf>,
    pub settings: Settings,
}

impl SettingsCommand {
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Settings::config_path()?,
        };

        writeln!(out, "Settings file: {}", path.display())?;
        if !path.exists() {
            writeln!(out, "(not found, showing defaults)")?;
        }
        writeln!(out, "\n{}", toml::to_string_pretty(&self.settings)?)?;
        Ok(())
    }
}

#[async_trait]
impl Command for SettingsCommand {
    async fn execute(&self) -> Result<()> {
        self.write_to(&mut std::io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn render(command: &SettingsCommand) -> String {
        let mut out = Vec::new();
        command.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn missing_file_shows_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let command = SettingsCommand {
            settings: Settings::load(Some(&path)).unwrap(),
            path: Some(path.clone()),
        };

        let text = render(&command);
        assert!(text.starts_with(&format!("Settings file: {}\n", path.display())));
        assert!(text.contains("(not found, showing defaults)"));
        assert!(text.contains("ack_delay_ms = 200"));
    }

    #[test]
    fn loaded_file_values_are_printed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ack_delay_ms = 75\nvoice = \"Puck\"").unwrap();
        let command = SettingsCommand {
            settings: Settings::load(Some(file.path())).unwrap(),
            path: Some(file.path().to_path_buf()),
        };

        let text = render(&command);
        assert!(!text.contains("not found"));
        assert!(text.contains("ack_delay_ms = 75"));
        assert!(text.contains("voice = \"Puck\""));
        assert!(text.contains("model = \"models/gemini-2.0-flash-exp\""));
    }
}
