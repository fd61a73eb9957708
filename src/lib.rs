//! # meshcore
//!
//! Data model and validation core for service mesh routing configuration:
//! match predicates over headers, paths, query parameters and gRPC
//! metadata, duration normalization, port and connection limits,
//! cross-object references, and subject alternative name matching.
//!
//! ## Architecture
//!
//! ```text
//! ModelDocument (YAML/JSON) → validate → ValidatedModel → evaluate
//!        ↓                        ↓
//!    wire types            compiled predicates, resolved references
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use meshcore::domain::{HeaderMatchMethod, MatchMethod, RegexCache};
//!
//! let method = HeaderMatchMethod { prefix: Some("v2".into()), ..Default::default() };
//! let predicate = method.compile(RegexCache::global()).unwrap();
//! assert!(predicate.evaluate("v2.1"));
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod model;
pub mod observability;

pub use config::AppConfig;
pub use errors::{MeshError, Result, ValidationErrors};
pub use model::{ModelDocument, ValidatedModel};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
