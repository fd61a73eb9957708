//! Outbound connection pool limits
//!
//! Every limit is strictly positive when present. The HTTP pending-request
//! limit is independent of the connection limit; a queue longer than the
//! connection count is legal.

use serde::{Deserialize, Serialize};

use super::port::PortProtocol;
use crate::errors::{join_field, FieldError, ValidationErrors};

fn check_limit(value: i64, field: &str, errors: &mut ValidationErrors) {
    if value < 1 {
        errors.push(FieldError::invariant(field, format!("must be at least 1, got {}", value)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpConnectionPool {
    pub max_connections: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConnectionPool {
    pub max_connections: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pending_requests: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Http2ConnectionPool {
    pub max_requests: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcConnectionPool {
    pub max_requests: i64,
}

/// Pool limits keyed by protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPool {
    Grpc(GrpcConnectionPool),
    Http(HttpConnectionPool),
    Http2(Http2ConnectionPool),
    Tcp(TcpConnectionPool),
}

impl ConnectionPool {
    pub fn protocol(&self) -> PortProtocol {
        match self {
            ConnectionPool::Grpc(_) => PortProtocol::Grpc,
            ConnectionPool::Http(_) => PortProtocol::Http,
            ConnectionPool::Http2(_) => PortProtocol::Http2,
            ConnectionPool::Tcp(_) => PortProtocol::Tcp,
        }
    }

    /// Check limits, keying each path under the protocol name (`http.maxConnections`)
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        self.collect_limit_errors(&join_field(field, self.protocol().as_str()), errors);
    }

    /// Check limits with paths directly under `field`
    pub fn collect_limit_errors(&self, field: &str, errors: &mut ValidationErrors) {
        match self {
            ConnectionPool::Tcp(pool) => {
                check_limit(pool.max_connections, &join_field(field, "maxConnections"), errors);
            }
            ConnectionPool::Http(pool) => {
                check_limit(pool.max_connections, &join_field(field, "maxConnections"), errors);
                if let Some(pending) = pool.max_pending_requests {
                    check_limit(pending, &join_field(field, "maxPendingRequests"), errors);
                }
            }
            ConnectionPool::Http2(pool) => {
                check_limit(pool.max_requests, &join_field(field, "maxRequests"), errors);
            }
            ConnectionPool::Grpc(pool) => {
                check_limit(pool.max_requests, &join_field(field, "maxRequests"), errors);
            }
        }
    }
}

/// Validate `pool` for a listener speaking `protocol`.
///
/// A pool of the wrong kind for the protocol is a schema error; a limit
/// below one is an invariant violation.
pub fn validate_connection_pool(
    pool: &ConnectionPool,
    protocol: PortProtocol,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if pool.protocol() != protocol {
        errors.push(FieldError::schema(
            "",
            format!("{} connection pool cannot apply to a {} listener", pool.protocol(), protocol),
        ));
    }
    pool.collect_errors("", &mut errors);
    errors.into_result(())
}
