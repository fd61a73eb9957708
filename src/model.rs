//! # Model Documents
//!
//! A model document is a namespace plus a list of named configuration
//! objects. Validating it runs every validator over every object, collects
//! all errors with their field paths, and on success produces a
//! [`ValidatedModel`]: compiled predicates, SAN matchers and resolved
//! references keyed by object name.
//!
//! ```yaml
//! namespace: apps
//! objects:
//!   - name: api-path
//!     kind: HTTPPathMatch
//!     spec:
//!       regex: "^/api/v[0-9]+"
//!   - name: backend
//!     kind: VirtualNodeReference
//!     spec:
//!       name: backend-v1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::domain::{
    BoundIdentity, ConnectionPool, Duration, GrpcConnectionPool, GrpcRouteMetadataMatchMethod,
    GrpcTimeout, HeaderMatchMethod, Http2ConnectionPool, HttpConnectionPool, HttpPathMatch,
    HttpQueryParameters, HttpTimeout, MatchPredicate, MatchRange, MeshIdentity, MeshReference,
    NamespacedReference, ObjectIdentity, PortMapping, QueryMatchMethod, QueryParameterPredicate,
    RegexCache, SanMatcher, SubjectAlternativeNames, TcpConnectionPool, TcpTimeout, Timeout,
    VirtualGatewayReference, VirtualNodeReference, VirtualRouterReference,
    VirtualServiceReference,
};
use crate::errors::{join_field, FieldError, MeshError, Result, ValidationErrors};

/// Every object kind a model document may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum ModelObject {
    Duration(Duration),
    MatchRange(MatchRange),
    HeaderMatchMethod(HeaderMatchMethod),
    #[serde(rename = "GRPCRouteMetadataMatchMethod")]
    GrpcRouteMetadataMatchMethod(GrpcRouteMetadataMatchMethod),
    #[serde(rename = "HTTPPathMatch")]
    HttpPathMatch(HttpPathMatch),
    QueryMatchMethod(QueryMatchMethod),
    #[serde(rename = "HTTPQueryParameters")]
    HttpQueryParameters(HttpQueryParameters),
    PortMapping(PortMapping),
    #[serde(rename = "HTTPTimeout")]
    HttpTimeout(HttpTimeout),
    #[serde(rename = "GRPCTimeout")]
    GrpcTimeout(GrpcTimeout),
    #[serde(rename = "TCPTimeout")]
    TcpTimeout(TcpTimeout),
    #[serde(rename = "TCPConnectionPool")]
    TcpConnectionPool(TcpConnectionPool),
    #[serde(rename = "HTTPConnectionPool")]
    HttpConnectionPool(HttpConnectionPool),
    #[serde(rename = "HTTP2ConnectionPool")]
    Http2ConnectionPool(Http2ConnectionPool),
    #[serde(rename = "GRPCConnectionPool")]
    GrpcConnectionPool(GrpcConnectionPool),
    VirtualNodeReference(VirtualNodeReference),
    VirtualServiceReference(VirtualServiceReference),
    VirtualRouterReference(VirtualRouterReference),
    MeshReference(MeshReference),
    VirtualGatewayReference(VirtualGatewayReference),
    SubjectAlternativeNames(SubjectAlternativeNames),
}

impl ModelObject {
    /// Wire name of this object's kind
    pub fn kind(&self) -> &'static str {
        match self {
            ModelObject::Duration(_) => "Duration",
            ModelObject::MatchRange(_) => "MatchRange",
            ModelObject::HeaderMatchMethod(_) => "HeaderMatchMethod",
            ModelObject::GrpcRouteMetadataMatchMethod(_) => "GRPCRouteMetadataMatchMethod",
            ModelObject::HttpPathMatch(_) => "HTTPPathMatch",
            ModelObject::QueryMatchMethod(_) => "QueryMatchMethod",
            ModelObject::HttpQueryParameters(_) => "HTTPQueryParameters",
            ModelObject::PortMapping(_) => "PortMapping",
            ModelObject::HttpTimeout(_) => "HTTPTimeout",
            ModelObject::GrpcTimeout(_) => "GRPCTimeout",
            ModelObject::TcpTimeout(_) => "TCPTimeout",
            ModelObject::TcpConnectionPool(_) => "TCPConnectionPool",
            ModelObject::HttpConnectionPool(_) => "HTTPConnectionPool",
            ModelObject::Http2ConnectionPool(_) => "HTTP2ConnectionPool",
            ModelObject::GrpcConnectionPool(_) => "GRPCConnectionPool",
            ModelObject::VirtualNodeReference(_) => "VirtualNodeReference",
            ModelObject::VirtualServiceReference(_) => "VirtualServiceReference",
            ModelObject::VirtualRouterReference(_) => "VirtualRouterReference",
            ModelObject::MeshReference(_) => "MeshReference",
            ModelObject::VirtualGatewayReference(_) => "VirtualGatewayReference",
            ModelObject::SubjectAlternativeNames(_) => "SubjectAlternativeNames",
        }
    }
}

/// Wire names of every [`ModelObject`] kind.
pub const KINDS: &[&str] = &[
    "Duration",
    "MatchRange",
    "HeaderMatchMethod",
    "GRPCRouteMetadataMatchMethod",
    "HTTPPathMatch",
    "QueryMatchMethod",
    "HTTPQueryParameters",
    "PortMapping",
    "HTTPTimeout",
    "GRPCTimeout",
    "TCPTimeout",
    "TCPConnectionPool",
    "HTTPConnectionPool",
    "HTTP2ConnectionPool",
    "GRPCConnectionPool",
    "VirtualNodeReference",
    "VirtualServiceReference",
    "VirtualRouterReference",
    "MeshReference",
    "VirtualGatewayReference",
    "SubjectAlternativeNames",
];

/// A configuration object as written in a document: `{ name, kind, spec }`.
///
/// The spec stays untyped until validation so that a malformed object is
/// reported next to every other problem in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedObject {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub spec: serde_json::Value,
}

/// Port mapping with its protocol still a plain string.
#[derive(Deserialize)]
struct RawPortMapping {
    port: i64,
    protocol: String,
}

impl NamedObject {
    pub fn new(name: impl Into<String>, object: ModelObject) -> Self {
        let spec = serde_json::to_value(&object)
            .ok()
            .and_then(|mut tagged| tagged.get_mut("spec").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null);
        Self { name: name.into(), kind: object.kind().to_string(), spec }
    }

    /// Decode the spec into its typed form.
    ///
    /// Errors carry paths relative to the object (`kind`, `spec`,
    /// `spec.protocol`). Port mappings are decoded leniently so a bad
    /// protocol and a bad port are reported together.
    pub fn decode(&self) -> std::result::Result<ModelObject, ValidationErrors> {
        if self.kind.is_empty() {
            return Err(FieldError::schema("kind", "is required").into());
        }
        if !KINDS.contains(&self.kind.as_str()) {
            return Err(FieldError::schema(
                "kind",
                format!("unknown kind '{}'; expected one of {}", self.kind, KINDS.join(", ")),
            )
            .into());
        }

        if self.kind == "PortMapping" {
            let raw: RawPortMapping = serde_json::from_value(self.spec.clone())
                .map_err(|e| FieldError::schema("spec", e.to_string()))?;
            return PortMapping::parse(raw.port, &raw.protocol)
                .map(ModelObject::PortMapping)
                .map_err(|nested| {
                    let mut errors = ValidationErrors::new();
                    errors.merge_nested("spec", nested);
                    errors
                });
        }

        let tagged = serde_json::json!({ "kind": self.kind, "spec": self.spec });
        serde_json::from_value(tagged)
            .map_err(|e| FieldError::schema("spec", e.to_string()).into())
    }
}

/// A set of configuration objects sharing one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Namespace of the referencing objects; falls back to the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub objects: Vec<NamedObject>,
}

/// Resolution of one reference object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "binding", rename_all = "lowercase")]
pub enum ResolvedReference {
    /// By-name reference, namespace defaulted
    Named { kind: &'static str, identity: ObjectIdentity },
    /// Mesh reference with its bound UID
    Mesh(BoundIdentity<MeshIdentity>),
    /// Virtual gateway reference with its bound UID
    Gateway(BoundIdentity<ObjectIdentity>),
}

/// Result of validating and resolving a [`ModelDocument`].
#[derive(Debug, Clone, Default)]
pub struct ValidatedModel {
    pub namespace: String,
    pub predicates: BTreeMap<String, MatchPredicate>,
    pub query_parameters: BTreeMap<String, QueryParameterPredicate>,
    pub san_matchers: BTreeMap<String, SanMatcher>,
    pub references: BTreeMap<String, ResolvedReference>,
    pub port_mappings: BTreeMap<String, PortMapping>,
    pub ranges: BTreeMap<String, MatchRange>,
    /// Canonical milliseconds of every standalone duration
    pub durations_ms: BTreeMap<String, i64>,
    pub timeouts: BTreeMap<String, Timeout>,
    pub connection_pools: BTreeMap<String, ConnectionPool>,
}

impl ValidatedModel {
    /// Evaluate the named match predicate or query parameter against `value`.
    ///
    /// Returns `None` when no evaluable object carries that name.
    pub fn evaluate(&self, name: &str, value: &str) -> Option<bool> {
        if let Some(predicate) = self.predicates.get(name) {
            return Some(predicate.evaluate(value));
        }
        if let Some(range) = self.ranges.get(name) {
            return Some(value.parse::<i64>().map(|n| range.contains(n)).unwrap_or(false));
        }
        self.query_parameters.get(name).map(|query| query.evaluate(Some(value)))
    }

    /// Evaluate the named SAN matcher against the peer's presented SANs
    pub fn evaluate_san<S: AsRef<str>>(&self, name: &str, peer_sans: &[S]) -> Option<bool> {
        self.san_matchers.get(name).map(|matcher| matcher.evaluate(peer_sans))
    }
}

impl ModelDocument {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read a document, choosing JSON for `.json` files and YAML otherwise
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MeshError::from(e).with_context(format!("reading {}", path.display()))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        };
        parsed.map_err(|e| e.with_context(format!("parsing {}", path.display())))
    }

    /// Validate every object and resolve every reference.
    ///
    /// `default_namespace` applies when the document does not declare one.
    pub fn validate(
        &self,
        default_namespace: &str,
        cache: &RegexCache,
    ) -> std::result::Result<ValidatedModel, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let namespace = self.namespace.as_deref().unwrap_or(default_namespace).to_string();
        if namespace.is_empty() {
            errors.push(FieldError::schema("namespace", "must not be empty"));
        }

        let mut model = ValidatedModel { namespace, ..Default::default() };
        let mut seen = HashSet::new();

        for (index, named) in self.objects.iter().enumerate() {
            let base = format!("objects[{}]", index);
            let spec_field = join_field(&base, "spec");
            let _span =
                crate::validation_span!(named.kind, spec_field, object = %named.name).entered();

            if named.name.is_empty() {
                errors.push(FieldError::schema(join_field(&base, "name"), "must not be empty"));
            } else if !seen.insert(named.name.as_str()) {
                errors.push(FieldError::schema(
                    join_field(&base, "name"),
                    format!("duplicate object name '{}'", named.name),
                ));
            }

            let before = errors.len();
            match named.decode() {
                Ok(object) => validate_object(
                    &named.name,
                    &object,
                    &spec_field,
                    cache,
                    &mut model,
                    &mut errors,
                ),
                Err(nested) => errors.merge_nested(&base, nested),
            }
            if errors.len() > before {
                tracing::debug!(
                    object = %named.name,
                    kind = %named.kind,
                    errors = errors.len() - before,
                    "object failed validation"
                );
            }
        }

        tracing::debug!(
            namespace = %model.namespace,
            objects = self.objects.len(),
            errors = errors.len(),
            "model document validated"
        );

        errors.into_result(model)
    }
}

fn compile_into<T>(
    result: std::result::Result<T, ValidationErrors>,
    name: &str,
    map: &mut BTreeMap<String, T>,
    errors: &mut ValidationErrors,
) {
    match result {
        Ok(value) => {
            map.insert(name.to_string(), value);
        }
        Err(nested) => errors.extend(nested),
    }
}

fn collect_into<T: Clone>(
    value: &T,
    name: &str,
    map: &mut BTreeMap<String, T>,
    errors: &mut ValidationErrors,
    check: impl FnOnce(&T, &mut ValidationErrors),
) {
    let before = errors.len();
    check(value, errors);
    if errors.len() == before {
        map.insert(name.to_string(), value.clone());
    }
}

fn resolve_into(
    result: Result<ResolvedReference>,
    name: &str,
    field: &str,
    model: &mut ValidatedModel,
    errors: &mut ValidationErrors,
) {
    match result {
        Ok(resolved) => {
            model.references.insert(name.to_string(), resolved);
        }
        Err(MeshError::Validation(nested)) => errors.merge_nested(field, nested),
        Err(e) => errors.push(FieldError::from_mesh(e, field)),
    }
}

fn named_reference_into<R: NamespacedReference>(
    reference: &R,
    name: &str,
    field: &str,
    model: &mut ValidatedModel,
    errors: &mut ValidationErrors,
) {
    let mut nested = ValidationErrors::new();
    reference.collect_errors(field, &mut nested);
    if !nested.is_empty() {
        errors.extend(nested);
        return;
    }
    let resolved = reference
        .resolve(&model.namespace)
        .map(|identity| ResolvedReference::Named { kind: R::KIND, identity });
    resolve_into(resolved, name, field, model, errors);
}

fn validate_object(
    name: &str,
    object: &ModelObject,
    field: &str,
    cache: &RegexCache,
    model: &mut ValidatedModel,
    errors: &mut ValidationErrors,
) {
    let namespace = model.namespace.clone();

    match object {
        ModelObject::Duration(duration) => match duration.to_canonical() {
            Ok(millis) => {
                model.durations_ms.insert(name.to_string(), millis);
            }
            Err(e) => errors.push(FieldError::from_mesh(e, field)),
        },
        ModelObject::MatchRange(range) => {
            collect_into(range, name, &mut model.ranges, errors, |r, e| r.collect_errors(field, e))
        }
        ModelObject::HeaderMatchMethod(method) => compile_into(
            MatchPredicate::compile_at(method, field, cache),
            name,
            &mut model.predicates,
            errors,
        ),
        ModelObject::GrpcRouteMetadataMatchMethod(method) => compile_into(
            MatchPredicate::compile_at(method, field, cache),
            name,
            &mut model.predicates,
            errors,
        ),
        ModelObject::HttpPathMatch(method) => compile_into(
            MatchPredicate::compile_at(method, field, cache),
            name,
            &mut model.predicates,
            errors,
        ),
        ModelObject::QueryMatchMethod(method) => compile_into(
            MatchPredicate::compile_at(method, field, cache),
            name,
            &mut model.predicates,
            errors,
        ),
        ModelObject::HttpQueryParameters(params) => compile_into(
            params.compile_at(field, cache),
            name,
            &mut model.query_parameters,
            errors,
        ),
        ModelObject::PortMapping(mapping) => collect_into(
            mapping,
            name,
            &mut model.port_mappings,
            errors,
            |m, e| m.collect_errors(field, e),
        ),
        ModelObject::HttpTimeout(timeout) => {
            let before = errors.len();
            timeout.collect_errors(field, errors);
            if errors.len() == before {
                model.timeouts.insert(name.to_string(), Timeout::Http(timeout.clone()));
            }
        }
        ModelObject::GrpcTimeout(timeout) => {
            let before = errors.len();
            timeout.collect_errors(field, errors);
            if errors.len() == before {
                model.timeouts.insert(name.to_string(), Timeout::Grpc(timeout.clone()));
            }
        }
        ModelObject::TcpTimeout(timeout) => {
            let before = errors.len();
            timeout.collect_errors(field, errors);
            if errors.len() == before {
                model.timeouts.insert(name.to_string(), Timeout::Tcp(timeout.clone()));
            }
        }
        ModelObject::TcpConnectionPool(pool) => {
            pool_into(ConnectionPool::Tcp(*pool), name, field, model, errors)
        }
        ModelObject::HttpConnectionPool(pool) => {
            pool_into(ConnectionPool::Http(*pool), name, field, model, errors)
        }
        ModelObject::Http2ConnectionPool(pool) => {
            pool_into(ConnectionPool::Http2(*pool), name, field, model, errors)
        }
        ModelObject::GrpcConnectionPool(pool) => {
            pool_into(ConnectionPool::Grpc(*pool), name, field, model, errors)
        }
        ModelObject::VirtualNodeReference(reference) => {
            named_reference_into(reference, name, field, model, errors)
        }
        ModelObject::VirtualServiceReference(reference) => {
            named_reference_into(reference, name, field, model, errors)
        }
        ModelObject::VirtualRouterReference(reference) => {
            named_reference_into(reference, name, field, model, errors)
        }
        ModelObject::MeshReference(reference) => {
            let mut nested = ValidationErrors::new();
            reference.collect_errors(field, &mut nested);
            if nested.is_empty() {
                let resolved = reference.resolve().map(ResolvedReference::Mesh);
                resolve_into(resolved, name, field, model, errors);
            } else {
                errors.extend(nested);
            }
        }
        ModelObject::VirtualGatewayReference(reference) => {
            let mut nested = ValidationErrors::new();
            reference.collect_errors(field, &mut nested);
            if nested.is_empty() {
                resolve_into(
                    reference.resolve_bound(&namespace).map(ResolvedReference::Gateway),
                    name,
                    field,
                    model,
                    errors,
                );
            } else {
                errors.extend(nested);
            }
        }
        ModelObject::SubjectAlternativeNames(sans) => {
            let mut nested = ValidationErrors::new();
            sans.collect_errors(field, &mut nested);
            if nested.is_empty() {
                compile_into(sans.compile(), name, &mut model.san_matchers, errors);
            } else {
                errors.extend(nested);
            }
        }
    }
}

/// Standalone pool kinds name their protocol, so only the limits are checked.
fn pool_into(
    pool: ConnectionPool,
    name: &str,
    field: &str,
    model: &mut ValidatedModel,
    errors: &mut ValidationErrors,
) {
    collect_into(&pool, name, &mut model.connection_pools, errors, |p, e| {
        p.collect_limit_errors(field, e)
    });
}
