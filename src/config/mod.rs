//! Persisted app configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "voicebox-studio";

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the generation service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Where downloaded files land. Falls back to the platform Downloads
    /// folder when unset.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            download_dir: None,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("config.json")
    }

    /// Load from disk, falling back to defaults for a missing or broken file.
    pub fn load() -> Self {
        let path = Self::path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Directory that download actions write into.
    pub fn effective_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_known_fields() {
        let config: Config = serde_json::from_str(r#"{"server_url":"http://box:8080/"}"#).unwrap();
        assert_eq!(config.server_url, "http://box:8080/");
        assert_eq!(config.download_dir, None);
    }

    #[test]
    fn explicit_download_dir_wins() {
        let config = Config {
            download_dir: Some(PathBuf::from("/tmp/out")),
            ..Config::default()
        };
        assert_eq!(config.effective_download_dir(), PathBuf::from("/tmp/out"));
    }
}
