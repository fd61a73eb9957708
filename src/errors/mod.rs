//! # Error Handling
//!
//! Error types shared by every validator, the reference resolver, and the
//! ambient configuration/document loaders.

pub mod types;

pub use types::{join_field, ErrorKind, FieldError, MeshError, Result, ValidationErrors};
