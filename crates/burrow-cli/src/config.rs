//! CLI configuration.

use crate::output::EventFormat;
use anyhow::Result;
use burrow_core::{OrchestratorConfig, bundled_executable_path, default_download_dir};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_wormhole_path")]
    pub wormhole_path: PathBuf,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,
    #[serde(default)]
    pub event_format: EventFormat,
}

/// The executable bundled next to the `burrow` binary.
fn default_wormhole_path() -> PathBuf {
    let resources = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")))
        .unwrap_or_else(|| PathBuf::from("resources"));
    bundled_executable_path(&resources)
}

fn default_confirm_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wormhole_path: default_wormhole_path(),
            download_dir: default_download_dir(),
            confirm_delay_ms: default_confirm_delay_ms(),
            event_format: EventFormat::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the user config directory or fall back to defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    /// `<config_dir>/burrow/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("burrow").join("config.toml"))
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            executable_path: self.wormhole_path.clone(),
            confirm_delay: Duration::from_millis(self.confirm_delay_ms),
            ..OrchestratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(r#"wormhole_path = "/usr/bin/wormhole""#).unwrap();
        assert_eq!(config.wormhole_path, PathBuf::from("/usr/bin/wormhole"));
        assert_eq!(config.confirm_delay_ms, 1000);
        assert_eq!(config.event_format, EventFormat::Text);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "download_dir = \"/srv/incoming\"\nconfirm_delay_ms = 250\nevent_format = \"json\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.download_dir, PathBuf::from("/srv/incoming"));
        assert_eq!(config.event_format, EventFormat::Json);

        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.confirm_delay, Duration::from_millis(250));
        assert_eq!(orchestrator.confirm_token, "y");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "confirm_delay_ms = \"soon\"").unwrap();
        assert!(Config::load_from(&path).is_err());
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_default_wormhole_path_is_bundled() {
        let config = Config::default();
        assert!(config.wormhole_path.to_string_lossy().contains("binaries"));
    }
}
