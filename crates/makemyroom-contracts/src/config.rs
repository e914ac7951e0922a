use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert Interior Design Consultant. You help users refine their room designs. You provide helpful advice on colors, layouts, and furniture. When users ask for products, use Google Search to find real shoppable links.";

/// Checked in order; the first non-empty value wins.
pub const API_KEY_ENV_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const API_BASE_ENV_VAR: &str = "GEMINI_API_BASE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Optional; the environment is the usual source.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    #[serde(default = "default_web_search")]
    pub web_search: bool,
    /// No timeout unless set.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Session event log (`events.jsonl`), off unless set.
    #[serde(default)]
    pub events: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.into()
}
fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.into()
}
fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.into()
}
fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.into()
}
fn default_web_search() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".into()
}
fn default_output_directory() -> PathBuf {
    PathBuf::from("makemyroom-out")
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            key: None,
            base_url: default_base_url(),
            image_model: default_image_model(),
            chat_model: default_chat_model(),
            system_instruction: default_system_instruction(),
            web_search: default_web_search(),
            request_timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            events: None,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl Settings {
    /// Reads the TOML file when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed reading {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("failed parsing {}", path.display()))?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// `lookup` is injected so tests do not touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|key| non_empty(key)) {
            self.api.key = Some(key);
        }
        if let Some(base) = non_empty(API_BASE_ENV_VAR) {
            self.api.base_url = base;
        }
        self.api.base_url = self.api.base_url.trim_end_matches('/').to_string();
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api
            .key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Settings, DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_original_client() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, DEFAULT_API_BASE);
        assert_eq!(settings.api.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(settings.api.chat_model, DEFAULT_CHAT_MODEL);
        assert!(settings.api.web_search);
        assert!(settings.api.request_timeout_secs.is_none());
        assert!(settings.api_key().is_none());
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() -> anyhow::Result<()> {
        let settings = Settings::from_toml(
            r#"
[api]
chat_model = "gemini-2.5-pro"
request_timeout_secs = 45

[logging]
events = "session/events.jsonl"
"#,
        )?;
        assert_eq!(settings.api.chat_model, "gemini-2.5-pro");
        assert_eq!(settings.api.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(settings.api.request_timeout_secs, Some(45));
        assert_eq!(
            settings.logging.events.as_deref(),
            Some(std::path::Path::new("session/events.jsonl"))
        );
        Ok(())
    }

    #[test]
    fn env_key_precedence_skips_blank_values() {
        let vars = env(&[("API_KEY", "  "), ("GEMINI_API_KEY", "g-key"), ("GOOGLE_API_KEY", "x")]);
        let mut settings = Settings::default();
        settings.apply_env(|key| vars.get(key).cloned());
        assert_eq!(settings.api_key(), Some("g-key"));
    }

    #[test]
    fn env_base_override_is_normalised() {
        let vars = env(&[("GEMINI_API_BASE", "http://127.0.0.1:9999/v1beta/")]);
        let mut settings = Settings::default();
        settings.apply_env(|key| vars.get(key).cloned());
        assert_eq!(settings.api.base_url, "http://127.0.0.1:9999/v1beta");
        assert!(settings.api_key().is_none());
    }

    #[test]
    fn load_reads_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("makemyroom.toml");
        std::fs::write(&path, "[output]\ndirectory = \"renders\"\n")?;
        let settings = Settings::load(Some(&path))?;
        assert_eq!(settings.output.directory, std::path::PathBuf::from("renders"));
        Ok(())
    }
}
