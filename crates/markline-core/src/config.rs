use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::detect::{DEFAULT_MIN_DISTANCE_SECONDS, DEFAULT_THRESHOLD, DetectionSettings};

pub const CONFIG_FILE_NAME: &str = "markline.config.toml";
pub const CONFIG_PATH_ENV: &str = "MARKLINE_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML from {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("detection threshold {0} must lie strictly between 0 and 1")]
    InvalidThreshold(f32),
    #[error("minimum marker distance {0}s must be a positive number of seconds")]
    InvalidMinDistance(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarklineConfig {
    pub detection: DetectionConfig,
    pub timeline: TimelineConfig,
    pub waveform: WaveformConfig,
    pub diagnostics: DiagnosticsConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub threshold: f32,
    pub min_distance_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub drag_tolerance_px: f64,
    pub rename_tolerance_px: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub rust_log_filter: String,
    pub trace_file_prefix: String,
    pub file_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_distance_seconds: DEFAULT_MIN_DISTANCE_SECONDS,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            drag_tolerance_px: 5.0,
            rename_tolerance_px: 8.0,
        }
    }
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: 1_000,
            height: 150,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rust_log_filter: crate::diagnostics::DEFAULT_FILTER.to_string(),
            trace_file_prefix: "markline".to_string(),
            file_logging: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl DetectionConfig {
    pub fn settings(&self) -> Result<DetectionSettings, ConfigError> {
        DetectionSettings::new(self.threshold, self.min_distance_seconds)
    }
}

impl MarklineConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.detection.settings()?;
        Ok(config)
    }

    /// Loads the discovered config file, or defaults when none exists. A file
    /// that exists but does not parse or validate is still an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match discover_config_path() {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let cwd = env::current_dir().ok()?;
    [cwd.join(CONFIG_FILE_NAME), cwd.join("..").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.is_file())
}
