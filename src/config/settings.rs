//! # Configuration Settings
//!
//! Defines the configuration structure for meshcore.

use crate::errors::{MeshError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    #[validate(nested)]
    pub logging: LoggingConfig,

    /// Reference resolution configuration
    #[validate(nested)]
    pub resolver: ResolverConfig,

    /// Regex compilation configuration
    #[validate(nested)]
    pub regex: RegexConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(MeshError::from)?;
        self.validate_custom()
    }

    /// Checks the validator crate cannot express
    fn validate_custom(&self) -> Result<()> {
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(MeshError::config(format!(
                "Invalid log level directive '{}'",
                self.logging.level
            )));
        }

        let namespace = &self.resolver.default_namespace;
        let dns_label = namespace
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !namespace.starts_with('-')
            && !namespace.ends_with('-');
        if !dns_label {
            return Err(MeshError::config(format!(
                "Default namespace '{}' is not a valid DNS label",
                namespace
            )));
        }

        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Text }
    }
}

/// Reference resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ResolverConfig {
    /// Namespace assumed for documents that do not declare one
    #[validate(length(min = 1, max = 63, message = "Namespace must be 1-63 characters"))]
    pub default_namespace: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { default_namespace: "default".to_string() }
    }
}

/// Regex compilation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegexConfig {
    /// Upper bound on a compiled program's size in bytes
    #[validate(range(min = 1024, message = "Regex size limit must be at least 1KB"))]
    pub size_limit: usize,

    /// Number of distinct compiled patterns kept in the cache
    #[validate(range(min = 1, message = "Regex cache capacity must be at least 1"))]
    pub cache_capacity: usize,
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self {
            size_limit: crate::domain::regex_cache::DEFAULT_SIZE_LIMIT,
            cache_capacity: crate::domain::regex_cache::DEFAULT_CAPACITY,
        }
    }
}

impl RegexConfig {
    /// Build a cache honouring these limits
    pub fn build_cache(&self) -> crate::domain::RegexCache {
        crate::domain::RegexCache::new(self.size_limit, self.cache_capacity)
    }
}
