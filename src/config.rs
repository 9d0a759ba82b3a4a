use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SubgenError};
use crate::subtitle::RepairPolicy;

// Default values for optional configuration fields
fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_upload_limit_mb() -> usize {
    512
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub subtitle: SubtitleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP service binds to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload size in MiB
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Gemini REST API
    pub endpoint: String,
    /// Model used for transcription and translation
    pub model: String,
    /// Environment variable holding the API key. The key itself is never
    /// stored in the configuration file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// HTTP timeout for a single model call in seconds
    pub timeout_secs: u64,
    /// Sampling temperature; the service default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Additional options inserted before the output path of the extraction
    /// command, e.g. ["-af", "loudnorm"]
    #[serde(default)]
    pub extract_options: Vec<String>,
    /// Directory for the temporary video/audio files; the system default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// How model output that deviates from canonical SRT is handled
    #[serde(default)]
    pub repair_policy: RepairPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_limit_mb: default_upload_limit_mb(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: default_api_key_env(),
            timeout_secs: 300,
            temperature: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            extract_options: vec![],
            temp_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        Self::api_key_from(&self.api_key_env, std::env::var(&self.api_key_env).ok())
    }

    fn api_key_from(var: &str, value: Option<String>) -> Result<String> {
        match value.map(|v| v.trim().to_string()) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(SubgenError::Config(format!(
                "{} environment variable is not set",
                var
            ))),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubgenError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubgenError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubgenError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubgenError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
