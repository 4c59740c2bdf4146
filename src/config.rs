use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string used when none is passed explicitly
    #[serde(default)]
    pub default_connection: Option<String>,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum idle connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Master bootstraps the configured database only; tenants fans out
    /// over `dbo.Tenants`. Ignored for SQLite.
    #[serde(default)]
    pub mode: BootstrapMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    SqlServer,
    #[default]
    Sqlite,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(Backend::SqlServer),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(anyhow!("unknown database backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMode {
    #[default]
    Master,
    Tenants,
}

impl FromStr for BootstrapMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "master" => Ok(BootstrapMode::Master),
            "tenants" | "tenant" => Ok(BootstrapMode::Tenants),
            other => Err(anyhow!("unknown bootstrap mode '{}'", other)),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("DATABASE_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::default(),
        };
        let mode = match lookup("BOOTSTRAP_MODE") {
            Some(value) => value.parse()?,
            None => BootstrapMode::default(),
        };

        Ok(Config {
            database: DatabaseConfig {
                default_connection: lookup("DEFAULT_CONNECTION")
                    .or_else(|| lookup("ConnectionStrings__DefaultConnection")),
                backend,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: lookup("DATABASE_MIN_CONNECTIONS")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_min_connections),
                connect_timeout_secs: lookup("DATABASE_CONNECT_TIMEOUT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_connect_timeout),
                idle_timeout_secs: lookup("DATABASE_IDLE_TIMEOUT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_idle_timeout),
            },
            bootstrap: BootstrapConfig { mode },
        })
    }
}

impl DatabaseConfig {
    /// Pick the connection string to use: an explicit non-blank value wins,
    /// otherwise the configured default. Fails only when neither is usable.
    pub fn resolve_connection_string(&self, explicit: Option<&str>) -> crate::Result<String> {
        explicit
            .filter(|s| !s.trim().is_empty())
            .or(self.default_connection.as_deref().filter(|s| !s.trim().is_empty()))
            .map(str::to_string)
            .ok_or_else(|| Error::Config("DefaultConnection is not configured.".to_string()))
    }
}
