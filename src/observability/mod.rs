//! # Observability
//!
//! Structured logging for meshcore. Validation paths emit debug spans and
//! events; evaluation paths stay silent.

pub mod logging;

pub use logging::{init_logging, log_config_info};
