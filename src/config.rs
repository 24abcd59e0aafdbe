use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    pub admin_password: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_background_poll_interval")]
    pub background_poll_interval_secs: u64,

    #[serde(default)]
    pub rotation_offset: u32,

    #[serde(default = "default_votes_path")]
    pub votes_path: String,

    #[serde(default = "default_vote_baseline_min")]
    pub vote_baseline_min: u32,

    #[serde(default = "default_vote_baseline_max")]
    pub vote_baseline_max: u32,
}

fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lyceum");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir
}

fn default_db_path() -> String {
    data_dir().join("lyceum.db").to_string_lossy().to_string()
}

fn default_votes_path() -> String {
    data_dir().join("votes.json").to_string_lossy().to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_background_poll_interval() -> u64 {
    60
}

fn default_vote_baseline_min() -> u32 {
    12
}

fn default_vote_baseline_max() -> u32 {
    48
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_address: default_bind_address(),
            admin_password: None,
            poll_interval_secs: default_poll_interval(),
            background_poll_interval_secs: default_background_poll_interval(),
            rotation_offset: 0,
            votes_path: default_votes_path(),
            vote_baseline_min: default_vote_baseline_min(),
            vote_baseline_max: default_vote_baseline_max(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lyceum")
            .join("config.toml")
    }

    /// Environment variables win over the file so secrets can stay out of it.
    fn apply_env(&mut self) {
        if let Ok(password) = std::env::var("LYCEUM_ADMIN_PASSWORD") {
            if !password.is_empty() {
                self.admin_password = Some(password);
            }
        }
        if let Ok(path) = std::env::var("LYCEUM_DB_PATH") {
            if !path.is_empty() {
                self.db_path = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 || self.background_poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll intervals must be at least one second".to_string(),
            ));
        }
        if self.vote_baseline_min > self.vote_baseline_max {
            return Err(AppError::Config(format!(
                "vote_baseline_min ({}) exceeds vote_baseline_max ({})",
                self.vote_baseline_min, self.vote_baseline_max
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn background_poll_interval(&self) -> Duration {
        Duration::from_secs(self.background_poll_interval_secs)
    }
}
