use crate::shared::infrastructure::outbox::config::{ConfigError, OutboxConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_PATH: &str = "storefront.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_path: PathBuf,
    pub outbox: OutboxConfig,
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "HTTP_ADDR",
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;
        let database_path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
            .into();
        Ok(Self {
            http_addr,
            database_path,
            outbox: OutboxConfig::from_lookup(&lookup)?,
        })
    }
}
