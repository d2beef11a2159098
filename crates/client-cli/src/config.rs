use anyhow::{bail, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `limit` query parameter for list endpoints
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// How long the booking confirmation stays on screen
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
    /// Number of upcoming sessions listed on the catalog screen
    #[serde(default = "default_sessions_shown")]
    pub sessions_shown: usize,
    /// Ask the server to populate demo data on startup
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_timeout_secs() -> u64 { 15 }
fn default_page_limit() -> u32 { 100 }
fn default_toast_secs() -> u64 { 5 }
fn default_sessions_shown() -> usize { 6 }
fn default_true() -> bool { true }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_secs: default_toast_secs(),
            sessions_shown: default_sessions_shown(),
            seed_demo: true,
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "cinema", "cinema")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.ui.toast_secs)
    }

    /// Set a value by its `cinema config set` key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" | "server" => self.api.base_url = value.trim_end_matches('/').to_string(),
            "timeout_secs" => self.api.timeout_secs = value.parse()?,
            "page_limit" => self.api.page_limit = value.parse()?,
            "toast_secs" => self.ui.toast_secs = value.parse()?,
            "sessions_shown" => self.ui.sessions_shown = value.parse()?,
            "seed_demo" => self.ui.seed_demo = value.parse()?,
            _ => bail!(
                "Unknown config key: {}. Valid keys: base_url, timeout_secs, page_limit, toast_secs, sessions_shown, seed_demo",
                key
            ),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "base_url" | "server" => self.api.base_url.clone(),
            "timeout_secs" => self.api.timeout_secs.to_string(),
            "page_limit" => self.api.page_limit.to_string(),
            "toast_secs" => self.ui.toast_secs.to_string(),
            "sessions_shown" => self.ui.sessions_shown.to_string(),
            "seed_demo" => self.ui.seed_demo.to_string(),
            _ => bail!("Unknown config key: {}", key),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.toast_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"http://cinema.local:9000\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://cinema.local:9000");
        assert_eq!(config.api.timeout_secs, 15);
        assert!(config.ui.seed_demo);
    }

    #[test]
    fn test_set_get_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set("base_url", "http://10.0.0.5:8000/").unwrap();
        config.set("seed_demo", "false").unwrap();
        config.set("toast_secs", "2").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.get("base_url").unwrap(), "http://10.0.0.5:8000");
        assert_eq!(loaded.get("seed_demo").unwrap(), "false");
        assert_eq!(loaded.toast_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut config = Config::default();
        assert!(config.set("colour", "red").is_err());
        assert!(config.get("colour").is_err());
        assert!(config.set("timeout_secs", "soon").is_err());
    }
}
