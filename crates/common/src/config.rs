//! Application configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use diacap_caption_model::CaptionConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DiacapError, DiacapResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Caption generation settings used by `merge`.
    pub captions: CaptionConfig,

    /// External diarization settings used by `diarize`.
    pub diarization: DiarizationConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Compute device handed to the diarization command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Let the diarization command decide.
    #[default]
    Auto,
    Cpu,
    /// Apple Metal Performance Shaders.
    Mps,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Mps => "mps",
        })
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "mps" => Ok(Device::Mps),
            other => Err(format!("Unknown device: {other}. Use: auto, cpu, mps")),
        }
    }
}

/// How to run the external diarization model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarizationConfig {
    /// Program and arguments. `{input}` is replaced by the audio path and
    /// `{device}` by the selected device. The program must print a JSON
    /// array of `{start, end, speaker}` turns on stdout.
    pub command: Vec<String>,

    pub device: Device,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "diacap_alignment=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location.
    ///
    /// A missing file yields defaults. A broken one also yields defaults,
    /// along with the error so the caller can warn once logging is up.
    pub fn load() -> (Self, Option<DiacapError>) {
        let config_path = config_file_path();
        if !config_path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load config from an explicit path. Errors are not swallowed.
    pub fn load_from(path: &Path) -> DiacapResult<Self> {
        if !path.exists() {
            return Err(DiacapError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DiacapError::config(format!("{}: {e}", path.display())))
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("diacap").join("config.json")
}
