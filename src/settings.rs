use anyhow::Result;
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{DEFAULT_ENDPOINT, DEFAULT_NOTICE_SECONDS, DEFAULT_RECORDING_SAMPLE_RATE};

/// Application preferences. Model configurations are never written to disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub default_endpoint: String,
    pub always_on_top: bool,
    pub request_timeout_secs: Option<u64>,
    pub recording_sample_rate: Option<u32>,
    pub notice_seconds: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            always_on_top: false,
            request_timeout_secs: None,
            recording_sample_rate: Some(DEFAULT_RECORDING_SAMPLE_RATE),
            notice_seconds: DEFAULT_NOTICE_SECONDS,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        match settings_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring invalid settings at {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "speechlab", "speech_lab")
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.default_endpoint, "http://localhost:8000/api/process");
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"request_timeout_secs": 30}"#).unwrap();

        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.recording_sample_rate, Some(16000));
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            default_endpoint: "http://127.0.0.1:9000/tts".to_string(),
            always_on_top: true,
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }
}
