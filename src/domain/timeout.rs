//! Per-protocol timeout policies
//!
//! Every duration is optional. An absent duration means the data plane
//! default applies; it is never read as zero.

use serde::{Deserialize, Serialize};

use super::duration::Duration;
use super::port::PortProtocol;
use crate::errors::{join_field, FieldError, Result, ValidationErrors};

fn check_optional(duration: &Option<Duration>, field: &str, errors: &mut ValidationErrors) {
    if let Some(duration) = duration {
        duration.collect_errors(field, errors);
    }
}

fn canonical(duration: &Option<Duration>) -> Result<Option<i64>> {
    duration.as_ref().map(Duration::to_canonical).transpose()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTimeout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_request: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<Duration>,
}

impl HttpTimeout {
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_optional(&self.per_request, &join_field(field, "perRequest"), errors);
        check_optional(&self.idle, &join_field(field, "idle"), errors);
    }

    pub fn per_request_millis(&self) -> Result<Option<i64>> {
        canonical(&self.per_request)
    }

    pub fn idle_millis(&self) -> Result<Option<i64>> {
        canonical(&self.idle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcTimeout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_request: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<Duration>,
}

impl GrpcTimeout {
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_optional(&self.per_request, &join_field(field, "perRequest"), errors);
        check_optional(&self.idle, &join_field(field, "idle"), errors);
    }

    pub fn per_request_millis(&self) -> Result<Option<i64>> {
        canonical(&self.per_request)
    }

    pub fn idle_millis(&self) -> Result<Option<i64>> {
        canonical(&self.idle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpTimeout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<Duration>,
}

impl TcpTimeout {
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_optional(&self.idle, &join_field(field, "idle"), errors);
    }

    pub fn idle_millis(&self) -> Result<Option<i64>> {
        canonical(&self.idle)
    }
}

/// Timeout block keyed by protocol, as a listener carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeout {
    Grpc(GrpcTimeout),
    Http(HttpTimeout),
    Http2(HttpTimeout),
    Tcp(TcpTimeout),
}

impl Timeout {
    pub fn protocol(&self) -> PortProtocol {
        match self {
            Timeout::Grpc(_) => PortProtocol::Grpc,
            Timeout::Http(_) => PortProtocol::Http,
            Timeout::Http2(_) => PortProtocol::Http2,
            Timeout::Tcp(_) => PortProtocol::Tcp,
        }
    }

    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        let field = join_field(field, self.protocol().as_str());
        match self {
            Timeout::Grpc(t) => t.collect_errors(&field, errors),
            Timeout::Http(t) | Timeout::Http2(t) => t.collect_errors(&field, errors),
            Timeout::Tcp(t) => t.collect_errors(&field, errors),
        }
    }

    /// Validate against the protocol of the listener that owns this block
    pub fn validate_for(
        &self,
        protocol: PortProtocol,
    ) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.protocol() != protocol {
            errors.push(FieldError::schema(
                "",
                format!("{} timeout cannot apply to a {} listener", self.protocol(), protocol),
            ));
        }
        self.collect_errors("", &mut errors);
        errors.into_result(())
    }

    /// Idle timeout in milliseconds, if configured
    pub fn idle_millis(&self) -> Result<Option<i64>> {
        match self {
            Timeout::Grpc(t) => t.idle_millis(),
            Timeout::Http(t) | Timeout::Http2(t) => t.idle_millis(),
            Timeout::Tcp(t) => t.idle_millis(),
        }
    }
}
