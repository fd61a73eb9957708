//! Subject alternative name matching for peer certificate validation.
//!
//! Matching is exact and case-sensitive. Wildcard entries are compared
//! literally, never expanded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::{join_field, FieldError, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAlternativeNameMatchers {
    #[serde(default)]
    pub exact: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAlternativeNames {
    #[serde(rename = "match")]
    pub matchers: SubjectAlternativeNameMatchers,
}

impl SubjectAlternativeNames {
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matchers: SubjectAlternativeNameMatchers {
                exact: names.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        let exact_field = join_field(&join_field(field, "match"), "exact");
        if self.matchers.exact.is_empty() {
            errors.push(FieldError::invariant(
                exact_field.clone(),
                "at least one subject alternative name is required",
            ));
        }

        for (index, name) in self.matchers.exact.iter().enumerate() {
            if name.is_empty() {
                errors.push(FieldError::schema(
                    join_field(&exact_field, &format!("[{}]", index)),
                    "must not be empty",
                ));
            }
        }
    }

    pub fn compile(&self) -> Result<SanMatcher, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect_errors("", &mut errors);
        errors.into_result(SanMatcher { names: self.matchers.exact.iter().cloned().collect() })
    }
}

/// Validated SAN set ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanMatcher {
    names: BTreeSet<String>,
}

impl SanMatcher {
    /// True when any presented SAN equals any configured name
    pub fn evaluate<S: AsRef<str>>(&self, peer_sans: &[S]) -> bool {
        peer_sans.iter().any(|san| self.names.contains(san.as_ref()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Wire form
    pub fn to_wire(&self) -> SubjectAlternativeNames {
        SubjectAlternativeNames::exact(self.names.iter().cloned())
    }
}
