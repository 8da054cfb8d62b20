use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const DEFAULT_ANALYSIS_URL: &str = "https://dhairyashah-deepfake-alpha-version.hf.space/analyze";
const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8787";

/// Language model used by the report relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    /// OpenAI-compatible base URL, without the trailing `/chat/completions`.
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-3.5-turbo".into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }
}

/// In-process report relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: DEFAULT_RELAY_BIND.into(),
        }
    }
}

/// Camera capture through an ffmpeg child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// ffmpeg binary name or path
    pub ffmpeg: String,
    /// ffmpeg demuxer, e.g. "v4l2", "avfoundation", "dshow"
    pub input_format: String,
    /// Device passed to `-i`
    pub device: String,
    /// Recording window in seconds
    pub window_secs: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        #[cfg(target_os = "macos")]
        let (input_format, device) = ("avfoundation", "0");
        #[cfg(target_os = "windows")]
        let (input_format, device) = ("dshow", "video=Integrated Camera");
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let (input_format, device) = ("v4l2", "/dev/video0");

        Self {
            ffmpeg: "ffmpeg".into(),
            input_format: input_format.into(),
            device: device.into(),
            window_secs: 5,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis_endpoint: String,
    pub report_endpoint: String,
    pub request_timeout_secs: u64,
    pub max_upload_mb: u64,
    pub relay: RelayConfig,
    pub llm: LlmConfig,
    pub camera: CameraConfig,
    /// Where exported reports go; the Downloads directory when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_endpoint: DEFAULT_ANALYSIS_URL.into(),
            report_endpoint: format!("http://{DEFAULT_RELAY_BIND}/api/generate-report"),
            request_timeout_secs: 300,
            max_upload_mb: 800,
            relay: RelayConfig::default(),
            llm: LlmConfig::default(),
            camera: CameraConfig::default(),
            export_dir: None,
        }
    }
}

impl Config {
    /// Directory: ~/.config/deepfake-inspector/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("deepfake-inspector");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk with environment overrides applied.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::path());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load from `path`, returning defaults if the file doesn't exist or is invalid.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.llm.api_key.is_empty() {
            if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
                self.llm.api_key = key;
            }
        }
        if let Some(url) = var("DEEPFAKE_ANALYSIS_URL").filter(|u| !u.is_empty()) {
            self.analysis_endpoint = url;
        }
        if let Some(url) = var("DEEPFAKE_REPORT_URL").filter(|u| !u.is_empty()) {
            self.report_endpoint = url;
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Export directory: configured, else Downloads, else the working directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(config.max_upload_mb, 800);
        assert_eq!(config.camera.window_secs, 5);
        assert!(config.relay.enabled);
        assert!(config.report_endpoint.ends_with("/api/generate-report"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"llm": {"model": "gpt-4o-mini"}, "max_upload_mb": 10}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.analysis_endpoint, DEFAULT_ANALYSIS_URL);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path).request_timeout_secs, 300);
    }

    #[test]
    fn save_then_load_preserves_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.llm.api_key = "sk-test".into();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).llm.api_key, "sk-test");
    }

    #[test]
    fn env_key_only_fills_an_empty_key() {
        let env = |key: &str| match key {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "DEEPFAKE_ANALYSIS_URL" => Some("http://localhost:9000/analyze".to_string()),
            _ => None,
        };

        let mut empty = Config::default();
        empty.apply_env(env);
        assert_eq!(empty.llm.api_key, "sk-env");
        assert_eq!(empty.analysis_endpoint, "http://localhost:9000/analyze");

        let mut stored = Config::default();
        stored.llm.api_key = "sk-stored".into();
        stored.apply_env(env);
        assert_eq!(stored.llm.api_key, "sk-stored");
    }
}
