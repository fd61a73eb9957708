//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.

use crate::config::{AppConfig, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for validating one configuration object.
///
/// ```rust,ignore
/// let span = validation_span!("HeaderMatchMethod", "objects[0].spec");
/// let span = validation_span!("PortMapping", "objects[1].spec", object = "web");
/// ```
#[macro_export]
macro_rules! validation_span {
    ($kind:expr, $field:expr) => {
        tracing::debug_span!(
            "validate_object",
            kind = %$kind,
            field = %$field
        )
    };
    ($kind:expr, $field:expr, $($extra:tt)*) => {
        tracing::debug_span!(
            "validate_object",
            kind = %$kind,
            field = %$field,
            $($extra)*
        )
    };
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output stays parseable. `RUST_LOG` takes
/// precedence over the configured level. Returns `false`
/// when a subscriber was already installed (e.g. by a test harness).
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Text => builder.try_init().is_ok(),
    };

    if installed {
        tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    }
    installed
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        log_level = %config.logging.level,
        log_format = ?config.logging.format,
        default_namespace = %config.resolver.default_namespace,
        regex_size_limit = config.regex.size_limit,
        regex_cache_capacity = config.regex.cache_capacity,
        "meshcore configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = validation_span!("HeaderMatchMethod", "objects[0].spec");
        let _span = validation_span!("PortMapping", "objects[1].spec", object = "web");
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }

    #[test]
    fn test_log_config_info() {
        log_config_info(&AppConfig::default());
    }
}
