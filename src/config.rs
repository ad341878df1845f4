use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("could not determine a config directory, set HITL_SESSION_FILE")]
    NoConfigDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    pub per_page: u32,
    pub session_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("HITL_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup("HITL_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    name: "HITL_TIMEOUT_SECS",
                    expected: "a positive number of seconds",
                    value: raw,
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let per_page = match lookup("HITL_PER_PAGE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_PER_PAGE).contains(n))
                .ok_or(ConfigError::Invalid {
                    name: "HITL_PER_PAGE",
                    expected: "a number between 1 and 100",
                    value: raw,
                })?,
            None => DEFAULT_PER_PAGE,
        };

        let session_file = match lookup("HITL_SESSION_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join("hitl")
                .join("session"),
        };

        Ok(Self {
            api_url: normalize_api_url(&api_url),
            timeout_secs,
            per_page,
            session_file,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
