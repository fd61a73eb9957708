//! Domain layer
//!
//! Pure value types for mesh routing configuration and the logic that
//! validates and evaluates them. Nothing here performs I/O or holds mutable
//! state apart from the shared regex cache, so every operation is safe to
//! call from any number of threads.
//!
//! ## Module Organization
//!
//! - `duration`: time quantities and millisecond normalization
//! - `range`: half-open integer intervals
//! - `predicate`: the match predicate engine
//! - `route_match`: header, gRPC metadata, path and query match wire types
//! - `port`: port numbers, protocols and port mappings
//! - `timeout`: per-protocol timeout policies
//! - `connection_pool`: per-protocol connection limits
//! - `reference`: cross-object references and their resolution
//! - `san`: subject alternative name matching
//! - `id`: object UIDs

pub mod connection_pool;
pub mod duration;
pub mod id;
pub mod port;
pub mod predicate;
pub mod range;
pub mod reference;
pub mod regex_cache;
pub mod route_match;
pub mod san;
pub mod timeout;

pub use connection_pool::{
    validate_connection_pool, ConnectionPool, GrpcConnectionPool, Http2ConnectionPool,
    HttpConnectionPool, TcpConnectionPool,
};
pub use duration::{Duration, DurationUnit};
pub use id::Uid;
pub use port::{PortMapping, PortNumber, PortProtocol};
pub use predicate::{
    CompiledRegex, MatchMethod, MatchPredicate, StrategyKind, HEADER_STRATEGIES,
    MAX_MATCH_LENGTH, PATH_STRATEGIES, QUERY_STRATEGIES,
};
pub use range::MatchRange;
pub use reference::{
    resolve, BoundIdentity, MeshIdentity, MeshReference, NamespacedReference, ObjectIdentity,
    VirtualGatewayReference, VirtualNodeReference, VirtualRouterReference,
    VirtualServiceReference,
};
pub use regex_cache::RegexCache;
pub use route_match::{
    GrpcRouteMetadataMatchMethod, HeaderMatchMethod, HttpPathMatch, HttpQueryParameters,
    QueryMatchMethod, QueryParameterPredicate,
};
pub use san::{SanMatcher, SubjectAlternativeNameMatchers, SubjectAlternativeNames};
pub use timeout::{GrpcTimeout, HttpTimeout, TcpTimeout, Timeout};
