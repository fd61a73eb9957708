//! # Configuration Management
//!
//! Layered configuration: built-in defaults, an optional file (YAML, TOML or
//! JSON by extension), then `MESHCORE_` environment variables with `__`
//! separating nested keys (e.g. `MESHCORE_RESOLVER__DEFAULT_NAMESPACE`).

pub mod settings;

pub use settings::{AppConfig, LogFormat, LoggingConfig, RegexConfig, ResolverConfig};

use crate::errors::{MeshError, Result};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MESHCORE";

impl AppConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&AppConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(MeshError::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: AppConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(
            log_level = %loaded.logging.level,
            default_namespace = %loaded.resolver.default_namespace,
            regex_size_limit = loaded.regex.size_limit,
            "Loaded configuration"
        );

        Ok(loaded)
    }
}
