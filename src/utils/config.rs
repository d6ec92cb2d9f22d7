use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;

pub const ADDR_ENV: &str = "LIVEFEED_ADDR";
pub const FRONT_URL_ENV: &str = "LIVEFEED_FRONT_URL";
pub const SEED_ENV: &str = "LIVEFEED_SEED";

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_FRONT_URL: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value `{value}` for {key} : {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid_value(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Server settings, read from the environment (and `.env` through dotenvy)
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the server listens on
    pub addr: SocketAddr,
    /// Only origin allowed by CORS
    pub front_url: String,
    /// JSON file with the initial users and posts
    pub seed: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_value(ADDR_ENV, &addr, e))?;

        Ok(Self {
            addr,
            front_url: std::env::var(FRONT_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_FRONT_URL.to_string()),
            seed: std::env::var_os(SEED_ENV).map(PathBuf::from),
        })
    }
}
