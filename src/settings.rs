use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub meter: MeterSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeterSettings {
    pub channels: Option<usize>,
    pub buffer: Option<usize>,       // Smoothing depth
    pub amplify: Option<f32>,
    pub values: Option<bool>,
    pub index: Option<bool>,
    pub device: Option<String>,      // Input device name, default device if unset
    pub block_size: Option<u32>,     // Requested frames per callback
    pub refresh_ms: Option<u64>,
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), "ignoring malformed settings: {err}");
                Self::default()
            }),
            Err(err) => {
                warn!(path = %path.display(), "cannot read settings: {err}");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("peakbar")
            .join("config.toml")
    }
}
