//! Object UID newtype
//!
//! Kubernetes assigns every object an immutable UID at creation time. A
//! reference that records the UID it was bound to can tell a recreated
//! object (same name, new UID) apart from the one it originally pointed at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable unique identifier of a bound object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Uid> for String {
    fn from(id: Uid) -> Self {
        id.0
    }
}
