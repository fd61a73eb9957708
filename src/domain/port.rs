//! Port mapping domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{join_field, FieldError, MeshError, Result, ValidationErrors};

pub const MIN_PORT: i64 = 1;
pub const MAX_PORT: i64 = 65535;

/// Port number as carried on the wire. Bounds are checked during validation,
/// not at deserialization, so an out-of-range value is reported with its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(pub i64);

impl PortNumber {
    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_in_range(self) -> bool {
        (MIN_PORT..=MAX_PORT).contains(&self.0)
    }

    /// Narrow to `u16` once the bound holds
    pub fn as_u16(self) -> Option<u16> {
        if self.is_in_range() {
            u16::try_from(self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application protocol spoken on a port. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PortProtocol {
    Grpc,
    Http,
    Http2,
    Tcp,
}

impl PortProtocol {
    pub const ALL: [PortProtocol; 4] =
        [PortProtocol::Grpc, PortProtocol::Http, PortProtocol::Http2, PortProtocol::Tcp];

    pub fn as_str(self) -> &'static str {
        match self {
            PortProtocol::Grpc => "grpc",
            PortProtocol::Http => "http",
            PortProtocol::Http2 => "http2",
            PortProtocol::Tcp => "tcp",
        }
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortProtocol {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        PortProtocol::ALL.into_iter().find(|p| p.as_str() == s).ok_or_else(|| {
            MeshError::schema_field(
                format!("unknown protocol '{}', expected one of: grpc, http, http2, tcp", s),
                "protocol",
            )
        })
    }
}

impl TryFrom<String> for PortProtocol {
    type Error = MeshError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PortProtocol> for String {
    fn from(protocol: PortProtocol) -> Self {
        protocol.as_str().to_string()
    }
}

/// Binds a port to a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    pub port: PortNumber,
    pub protocol: PortProtocol,
}

impl PortMapping {
    pub fn new(port: i64, protocol: PortProtocol) -> Self {
        Self { port: PortNumber(port), protocol }
    }

    /// Build a mapping from untyped inputs, collecting both the port bound
    /// and the protocol enum check.
    pub fn parse(port: i64, protocol: &str) -> std::result::Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let port = PortNumber(port);
        check_port(port, "port", &mut errors);

        let protocol = match protocol.parse::<PortProtocol>() {
            Ok(protocol) => Some(protocol),
            Err(e) => {
                errors.push(FieldError::from_mesh(e, ""));
                None
            }
        };

        match protocol {
            Some(protocol) if errors.is_empty() => Ok(Self { port, protocol }),
            _ => Err(errors),
        }
    }

    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_port(self.port, &join_field(field, "port"), errors);
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect_errors("", &mut errors);
        errors.into_result(())
    }
}

fn check_port(port: PortNumber, field: &str, errors: &mut ValidationErrors) {
    if !port.is_in_range() {
        errors.push(FieldError::range(
            field,
            format!("port must be between {} and {}, got {}", MIN_PORT, MAX_PORT, port),
        ));
    }
}
