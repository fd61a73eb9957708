//! Match predicate engine
//!
//! Wire-level match methods carry one optional field per strategy. They are
//! compiled into a [`MatchPredicate`], a closed sum type with exactly one
//! strategy, so the "none set" and "several set" states cannot exist past
//! validation. Only compiled predicates can be evaluated, and evaluation
//! never fails.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::range::MatchRange;
use super::regex_cache::RegexCache;
use crate::errors::{join_field, FieldError, ValidationErrors};

/// Longest operand accepted for string strategies, in characters
pub const MAX_MATCH_LENGTH: usize = 255;

/// One matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Exact,
    Prefix,
    Suffix,
    Regex,
    Range,
}

impl StrategyKind {
    /// Wire field carrying this strategy
    pub fn field_name(self) -> &'static str {
        match self {
            StrategyKind::Exact => "exact",
            StrategyKind::Prefix => "prefix",
            StrategyKind::Suffix => "suffix",
            StrategyKind::Regex => "regex",
            StrategyKind::Range => "range",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Strategies legal for header and gRPC metadata matches
pub const HEADER_STRATEGIES: &[StrategyKind] = &[
    StrategyKind::Exact,
    StrategyKind::Prefix,
    StrategyKind::Suffix,
    StrategyKind::Regex,
    StrategyKind::Range,
];

/// Strategies legal for HTTP path matches
pub const PATH_STRATEGIES: &[StrategyKind] = &[StrategyKind::Exact, StrategyKind::Regex];

/// Strategies legal for query parameter matches
pub const QUERY_STRATEGIES: &[StrategyKind] = &[StrategyKind::Exact];

/// Operand of a strategy as it appears on the wire.
#[derive(Debug, Clone, Copy)]
pub enum StrategyOperand<'a> {
    Text(&'a str),
    Range(&'a MatchRange),
}

/// A wire object shaped as "at most one of N optional strategy fields".
pub trait MatchMethod: Sized {
    /// Strategies this object may legally carry
    const LEGAL: &'static [StrategyKind];

    /// Every strategy field that is set, in declaration order
    fn strategies(&self) -> Vec<(StrategyKind, StrategyOperand<'_>)>;

    /// Wire form of a compiled predicate, `None` when its strategy is not legal here
    fn from_predicate(predicate: &MatchPredicate) -> Option<Self>;

    /// Compile this method into a predicate
    fn compile(&self, cache: &RegexCache) -> Result<MatchPredicate, ValidationErrors> {
        MatchPredicate::compile_at(self, "", cache)
    }
}

/// Regex strategy with its compiled program.
#[derive(Debug, Clone)]
pub struct CompiledRegex {
    pattern: String,
    program: Arc<Regex>,
}

impl CompiledRegex {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.program.is_match(value)
    }
}

impl PartialEq for CompiledRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for CompiledRegex {}

/// A validated single-strategy predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPredicate {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Regex(CompiledRegex),
    Range(MatchRange),
}

impl MatchPredicate {
    /// Compile `method`, reporting errors with paths under `field`.
    ///
    /// All problems are collected: illegal strategies, bad operand lengths,
    /// broken ranges, regexes that fail to compile, and the exclusivity
    /// check itself.
    pub fn compile_at<M: MatchMethod>(
        method: &M,
        field: &str,
        cache: &RegexCache,
    ) -> Result<Self, ValidationErrors> {
        let strategies = method.strategies();
        let mut errors = ValidationErrors::new();
        let mut compiled_regex = None;

        for (kind, operand) in &strategies {
            let path = join_field(field, kind.field_name());

            if !M::LEGAL.contains(kind) {
                errors.push(FieldError::invariant(
                    path.clone(),
                    format!("'{}' is not supported here; allowed: {}", kind, describe(M::LEGAL)),
                ));
            }

            match operand {
                StrategyOperand::Text(text) => {
                    let length = text.chars().count();
                    if length == 0 || length > MAX_MATCH_LENGTH {
                        errors.push(FieldError::schema(
                            path.clone(),
                            format!(
                                "must be between 1 and {} characters, got {}",
                                MAX_MATCH_LENGTH, length
                            ),
                        ));
                        continue;
                    }

                    if *kind == StrategyKind::Regex {
                        match cache.compile(text) {
                            Ok(program) => {
                                compiled_regex = Some(CompiledRegex {
                                    pattern: text.to_string(),
                                    program,
                                })
                            }
                            Err(e) => errors.push(FieldError::invariant(
                                path.clone(),
                                format!("regex does not compile: {}", e),
                            )),
                        }
                    }
                }
                StrategyOperand::Range(range) => range.collect_errors(&path, &mut errors),
            }
        }

        match strategies.len() {
            0 => errors.push(FieldError::invariant(
                field,
                format!("exactly one of {} must be set, none is", describe(M::LEGAL)),
            )),
            1 => {}
            _ => {
                let set: Vec<StrategyKind> = strategies.iter().map(|(kind, _)| *kind).collect();
                errors.push(FieldError::invariant(
                    field,
                    format!(
                        "exactly one of {} must be set, found {}",
                        describe(M::LEGAL),
                        describe(&set)
                    ),
                ));
            }
        }

        if !errors.is_empty() {
            tracing::debug!(field, errors = errors.len(), "match method rejected");
            return Err(errors);
        }

        let predicate = match strategies[0] {
            (StrategyKind::Exact, StrategyOperand::Text(t)) => MatchPredicate::Exact(t.to_string()),
            (StrategyKind::Prefix, StrategyOperand::Text(t)) => {
                MatchPredicate::Prefix(t.to_string())
            }
            (StrategyKind::Suffix, StrategyOperand::Text(t)) => {
                MatchPredicate::Suffix(t.to_string())
            }
            (StrategyKind::Range, StrategyOperand::Range(r)) => MatchPredicate::Range(*r),
            (StrategyKind::Regex, _) => match compiled_regex {
                Some(regex) => MatchPredicate::Regex(regex),
                None => {
                    return Err(FieldError::invariant(
                        join_field(field, "regex"),
                        "regex operand missing",
                    )
                    .into())
                }
            },
            (kind, _) => {
                return Err(FieldError::schema(
                    join_field(field, kind.field_name()),
                    "operand has the wrong shape for this strategy",
                )
                .into())
            }
        };

        Ok(predicate)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MatchPredicate::Exact(_) => StrategyKind::Exact,
            MatchPredicate::Prefix(_) => StrategyKind::Prefix,
            MatchPredicate::Suffix(_) => StrategyKind::Suffix,
            MatchPredicate::Regex(_) => StrategyKind::Regex,
            MatchPredicate::Range(_) => StrategyKind::Range,
        }
    }

    /// Evaluate against a string attribute.
    ///
    /// String strategies are case-sensitive. A regex matches anywhere in the
    /// value. A range strategy parses the value as a base-10 `i64`; a value
    /// that does not parse never matches.
    pub fn evaluate(&self, value: &str) -> bool {
        match self {
            MatchPredicate::Exact(expected) => value == expected,
            MatchPredicate::Prefix(prefix) => value.starts_with(prefix.as_str()),
            MatchPredicate::Suffix(suffix) => value.ends_with(suffix.as_str()),
            MatchPredicate::Regex(regex) => regex.is_match(value),
            MatchPredicate::Range(range) => {
                value.parse::<i64>().map(|n| range.contains(n)).unwrap_or(false)
            }
        }
    }

    /// Evaluate against an integer attribute
    pub fn evaluate_integer(&self, value: i64) -> bool {
        match self {
            MatchPredicate::Range(range) => range.contains(value),
            _ => self.evaluate(&value.to_string()),
        }
    }

    /// Wire form of this predicate for the given method type
    pub fn to_method<M: MatchMethod>(&self) -> Option<M> {
        M::from_predicate(self)
    }
}

fn describe(kinds: &[StrategyKind]) -> String {
    kinds.iter().map(|k| k.field_name()).collect::<Vec<_>>().join(", ")
}
