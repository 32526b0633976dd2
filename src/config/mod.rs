//! Configuration reading and data directory paths.

pub mod paths;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::get_data_dir;

/// Top-level optimus_config.json shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    pub user_name: Option<String>,
    pub assistant_name: String,
    pub input: InputConfig,
    pub stt: SttConfig,
    pub tts: TtsConfig,
    /// Play synthesized speech through the default output device.
    pub audio_output: Option<bool>,
    pub music_dir: Option<PathBuf>,
    /// Spoken application name -> launch command.
    pub apps: HashMap<String, String>,
    pub llm: LlmConfig,
    pub web: WebConfig,
    pub mcp: McpConfig,
    pub mail: MailConfig,
    pub reminders: ReminderConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            user_name: None,
            assistant_name: "Optimus".to_string(),
            input: InputConfig::default(),
            stt: SttConfig::default(),
            tts: TtsConfig::default(),
            audio_output: None,
            music_dir: None,
            apps: HashMap::new(),
            llm: LlmConfig::default(),
            web: WebConfig::default(),
            mcp: McpConfig::default(),
            mail: MailConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Transcripts arrive as JSON lines (or plain text lines) on stdin.
    Stdin,
    /// Microphone capture + speech-to-text.
    Microphone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputConfig {
    pub mode: InputMode,
    pub device: Option<String>,
    pub listen_timeout_secs: u64,
    pub phrase_limit_secs: u64,
    pub pause_secs: f32,
    pub energy_threshold: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mode: InputMode::Stdin,
            device: None,
            listen_timeout_secs: 10,
            phrase_limit_secs: 15,
            pause_secs: 1.0,
            energy_threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SttConfig {
    pub adapter: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model_size: Option<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            adapter: "openai-cloud".to_string(),
            api_key: None,
            endpoint: None,
            model_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsConfig {
    pub adapter: String,
    pub voice: Option<String>,
    pub api_key: Option<String>,
    pub volume: Option<f32>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            adapter: "console".to_string(),
            voice: None,
            api_key: None,
            volume: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebConfig {
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McpConfig {
    pub server_url: Option<String>,
}

/// SMTP relay settings. Without a host, mail is queued to `outbox.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            username: None,
            password: None,
            from_email: None,
            from_name: "Optimus".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
        }
    }
}

impl AssistantConfig {
    /// Whether speech should be played on the audio device. Defaults to on
    /// only when listening through the microphone.
    pub fn plays_audio(&self) -> bool {
        self.audio_output
            .unwrap_or(self.input.mode == InputMode::Microphone)
    }

    /// Fill unset secrets from the environment.
    pub fn apply_env_fallbacks(&mut self) {
        fill_from_env(&mut self.llm.api_key, &["OPTIMUS_LLM_API_KEY", "OPENAI_API_KEY"]);
        fill_from_env(&mut self.stt.api_key, &["OPENAI_API_KEY"]);
        let tts_env: &[&str] = match self.tts.adapter.as_str() {
            "elevenlabs" => &["ELEVENLABS_API_KEY"],
            _ => &["OPENAI_API_KEY"],
        };
        fill_from_env(&mut self.tts.api_key, tts_env);
        fill_from_env(&mut self.web.weather_api_key, &["WEATHER_API_KEY"]);
        fill_from_env(&mut self.web.news_api_key, &["NEWS_API_KEY"]);
        fill_from_env(&mut self.web.google_api_key, &["GOOGLE_API_KEY"]);
        fill_from_env(&mut self.web.google_cse_id, &["GOOGLE_CSE_ID"]);
        fill_from_env(&mut self.mcp.server_url, &["OPTIMUS_MCP_URL"]);
        fill_from_env(&mut self.mail.smtp_host, &["SMTP_HOST"]);
        fill_from_env(&mut self.mail.username, &["SMTP_USERNAME"]);
        fill_from_env(&mut self.mail.password, &["SMTP_PASSWORD"]);
        fill_from_env(&mut self.mail.from_email, &["SMTP_FROM_EMAIL"]);
    }

    /// Resolved music library directory.
    pub fn music_dir(&self, data_dir: &Path) -> PathBuf {
        self.music_dir
            .clone()
            .or_else(dirs::audio_dir)
            .unwrap_or_else(|| data_dir.join("music"))
    }
}

fn fill_from_env(slot: &mut Option<String>, vars: &[&str]) {
    if slot.as_deref().is_some_and(|s| !s.is_empty()) {
        return;
    }
    *slot = vars
        .iter()
        .filter_map(|v| std::env::var(v).ok())
        .find(|v| !v.trim().is_empty());
}

/// Read optimus_config.json from the data directory, with env fallbacks applied.
pub fn read_assistant_config(data_dir: &Path) -> AssistantConfig {
    let path = get_config_path(data_dir);
    let mut config: AssistantConfig = read_json_file(&path).unwrap_or_default();
    config.apply_env_fallbacks();
    config
}

/// Resolve the data directory and make sure it exists.
pub fn ensure_data_dir() -> anyhow::Result<PathBuf> {
    let dir = get_data_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Path to optimus_config.json.
pub fn get_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("optimus_config.json")
}

/// Generic helper: read a JSON file and deserialize it.
pub(crate) fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: AssistantConfig =
            read_json_file(&get_config_path(dir.path())).unwrap_or_default();
        assert_eq!(cfg.assistant_name, "Optimus");
        assert_eq!(cfg.input.mode, InputMode::Stdin);
        assert_eq!(cfg.input.listen_timeout_secs, 10);
        assert_eq!(cfg.input.phrase_limit_secs, 15);
        assert_eq!(cfg.tts.adapter, "console");
        assert!(!cfg.plays_audio());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = get_config_path(dir.path());
        std::fs::write(
            &path,
            r#"{"userName": "Sam", "input": {"mode": "microphone"}, "apps": {"notepad": "gedit"}}"#,
        )
        .unwrap();

        let cfg: AssistantConfig = read_json_file(&path).unwrap();
        assert_eq!(cfg.user_name.as_deref(), Some("Sam"));
        assert_eq!(cfg.input.mode, InputMode::Microphone);
        assert_eq!(cfg.input.listen_timeout_secs, 10);
        assert_eq!(cfg.apps.get("notepad").map(String::as_str), Some("gedit"));
        assert!(cfg.plays_audio());
        assert!(cfg.reminders.enabled);
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = get_config_path(dir.path());
        std::fs::write(&path, "{ not json").unwrap();
        assert!(read_json_file::<AssistantConfig>(&path).is_none());
    }

    #[test]
    fn test_explicit_key_not_overwritten() {
        let mut slot = Some("from-file".to_string());
        fill_from_env(&mut slot, &["PATH"]);
        assert_eq!(slot.as_deref(), Some("from-file"));
    }
}
