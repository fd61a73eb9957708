//! Route match wire types
//!
//! Each type here is one instance of the "at most one optional strategy
//! field" shape, differing only in which strategies are legal. They all
//! compile through [`MatchPredicate::compile_at`].

use serde::{Deserialize, Serialize};

use super::predicate::{
    MatchMethod, MatchPredicate, StrategyKind, StrategyOperand, HEADER_STRATEGIES,
    PATH_STRATEGIES, QUERY_STRATEGIES,
};
use super::range::MatchRange;
use super::regex_cache::RegexCache;
use crate::errors::{join_field, FieldError, ValidationErrors};

fn push_text<'a>(
    set: &mut Vec<(StrategyKind, StrategyOperand<'a>)>,
    kind: StrategyKind,
    value: &'a Option<String>,
) {
    if let Some(text) = value {
        set.push((kind, StrategyOperand::Text(text)));
    }
}

fn text_of(predicate: &MatchPredicate, kind: StrategyKind) -> Option<String> {
    match (predicate, kind) {
        (MatchPredicate::Exact(v), StrategyKind::Exact)
        | (MatchPredicate::Prefix(v), StrategyKind::Prefix)
        | (MatchPredicate::Suffix(v), StrategyKind::Suffix) => Some(v.clone()),
        (MatchPredicate::Regex(r), StrategyKind::Regex) => Some(r.pattern().to_string()),
        _ => None,
    }
}

fn range_of(predicate: &MatchPredicate) -> Option<MatchRange> {
    match predicate {
        MatchPredicate::Range(r) => Some(*r),
        _ => None,
    }
}

/// Generates a five-strategy string match method (headers and gRPC metadata).
macro_rules! string_match_method {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// The value must match exactly
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub exact: Option<String>,

            /// The value must begin with these characters
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub prefix: Option<String>,

            /// The value, read as an integer, must fall in this range
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub range: Option<MatchRange>,

            /// The value must match this regular expression
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub regex: Option<String>,

            /// The value must end with these characters
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub suffix: Option<String>,
        }

        impl MatchMethod for $name {
            const LEGAL: &'static [StrategyKind] = HEADER_STRATEGIES;

            fn strategies(&self) -> Vec<(StrategyKind, StrategyOperand<'_>)> {
                let mut set = Vec::new();
                push_text(&mut set, StrategyKind::Exact, &self.exact);
                push_text(&mut set, StrategyKind::Prefix, &self.prefix);
                if let Some(range) = &self.range {
                    set.push((StrategyKind::Range, StrategyOperand::Range(range)));
                }
                push_text(&mut set, StrategyKind::Regex, &self.regex);
                push_text(&mut set, StrategyKind::Suffix, &self.suffix);
                set
            }

            fn from_predicate(predicate: &MatchPredicate) -> Option<Self> {
                Some(Self {
                    exact: text_of(predicate, StrategyKind::Exact),
                    prefix: text_of(predicate, StrategyKind::Prefix),
                    range: range_of(predicate),
                    regex: text_of(predicate, StrategyKind::Regex),
                    suffix: text_of(predicate, StrategyKind::Suffix),
                })
            }
        }
    };
}

string_match_method!(
    /// How an HTTP header value is matched.
    HeaderMatchMethod
);

string_match_method!(
    /// How a gRPC metadata value is matched.
    GrpcRouteMetadataMatchMethod
);

/// How an HTTP request path is matched. Only `exact` and `regex` are legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPathMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl MatchMethod for HttpPathMatch {
    const LEGAL: &'static [StrategyKind] = PATH_STRATEGIES;

    fn strategies(&self) -> Vec<(StrategyKind, StrategyOperand<'_>)> {
        let mut set = Vec::new();
        push_text(&mut set, StrategyKind::Exact, &self.exact);
        push_text(&mut set, StrategyKind::Regex, &self.regex);
        set
    }

    fn from_predicate(predicate: &MatchPredicate) -> Option<Self> {
        if !PATH_STRATEGIES.contains(&predicate.kind()) {
            return None;
        }
        Some(Self {
            exact: text_of(predicate, StrategyKind::Exact),
            regex: text_of(predicate, StrategyKind::Regex),
        })
    }
}

/// How a query parameter value is matched. Only `exact` is legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMatchMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
}

impl MatchMethod for QueryMatchMethod {
    const LEGAL: &'static [StrategyKind] = QUERY_STRATEGIES;

    fn strategies(&self) -> Vec<(StrategyKind, StrategyOperand<'_>)> {
        let mut set = Vec::new();
        push_text(&mut set, StrategyKind::Exact, &self.exact);
        set
    }

    fn from_predicate(predicate: &MatchPredicate) -> Option<Self> {
        match predicate {
            MatchPredicate::Exact(value) => Some(Self { exact: Some(value.clone()) }),
            _ => None,
        }
    }
}

/// A named query parameter and an optional value match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpQueryParameters {
    /// Required on the wire; kept optional so a missing name is reported
    /// alongside every other error instead of failing deserialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_method: Option<QueryMatchMethod>,
}

impl HttpQueryParameters {
    pub fn compile(&self, cache: &RegexCache) -> Result<QueryParameterPredicate, ValidationErrors> {
        self.compile_at("", cache)
    }

    pub fn compile_at(
        &self,
        field: &str,
        cache: &RegexCache,
    ) -> Result<QueryParameterPredicate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = match self.name.as_deref() {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            Some(_) => {
                errors.push(FieldError::schema(join_field(field, "name"), "must not be empty"));
                None
            }
            None => {
                errors.push(FieldError::schema(join_field(field, "name"), "is required"));
                None
            }
        };

        let value = match &self.match_method {
            Some(method) => {
                match MatchPredicate::compile_at(method, &join_field(field, "match"), cache) {
                    Ok(predicate) => Some(predicate),
                    Err(nested) => {
                        errors.extend(nested);
                        None
                    }
                }
            }
            None => None,
        };

        match name {
            Some(name) if errors.is_empty() => Ok(QueryParameterPredicate { name, value }),
            _ => Err(errors),
        }
    }
}

/// Compiled query parameter match. With no value predicate it is a presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameterPredicate {
    pub name: String,
    pub value: Option<MatchPredicate>,
}

impl QueryParameterPredicate {
    /// `value` is the parameter's value, or `None` when the request lacks it.
    pub fn evaluate(&self, value: Option<&str>) -> bool {
        match (value, &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(predicate)) => predicate.evaluate(actual),
        }
    }

    /// Look the parameter up in decoded `(name, value)` pairs; any occurrence may match.
    pub fn evaluate_query<'a, I>(&self, pairs: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs.into_iter().any(|(name, value)| name == self.name && self.evaluate(Some(value)))
    }

    /// Wire form
    pub fn to_wire(&self) -> HttpQueryParameters {
        HttpQueryParameters {
            name: Some(self.name.clone()),
            match_method: self.value.as_ref().and_then(QueryMatchMethod::from_predicate),
        }
    }
}
