//! Configuration loading and management

use crate::core::query::LimitOffsetPagination;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the YAML file to load
pub const CONFIG_PATH_ENV: &str = "RENTAL_CONFIG";

/// Environment variable overriding the bind address
pub const BIND_ENV: &str = "RENTAL_BIND";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:3000")
    pub bind: String,

    /// Upper bound on every store call, in milliseconds
    pub request_timeout_ms: u64,

    /// Allow cross-origin requests from any origin
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            request_timeout_ms: 5_000,
            permissive_cors: false,
        }
    }
}

/// Page sizes of paginated listings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        let defaults = LimitOffsetPagination::default();
        Self {
            default_limit: defaults.default_limit,
            max_limit: defaults.max_limit,
        }
    }
}

/// Sheet names of the exported workbooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub items_sheet: String,
    pub rentals_sheet: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            items_sheet: "Items".to_string(),
            rentals_sheet: "Rentals".to_string(),
        }
    }
}

/// Complete configuration of the rental service
///
/// Every section is optional in YAML; missing values fall back to the
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub reports: ReportConfig,
}

impl RentalConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("invalid config file {}", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `RENTAL_CONFIG` when set, then apply `RENTAL_BIND`
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(bind) = std::env::var(BIND_ENV) {
            config.server.bind = bind;
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.request_timeout_ms == 0 {
            anyhow::bail!("server.request_timeout_ms must be greater than zero");
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            anyhow::bail!("pagination.default_limit must be between 1 and pagination.max_limit");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn pagination(&self) -> LimitOffsetPagination {
        LimitOffsetPagination::new(self.pagination.default_limit, self.pagination.max_limit)
    }
}
