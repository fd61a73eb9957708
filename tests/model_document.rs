//! Model document integration tests
//!
//! Loads fixture documents from disk and checks the validated model and the
//! collected errors end to end.

use std::path::PathBuf;

use meshcore::domain::{ConnectionPool, PortProtocol, RegexCache, Timeout};
use meshcore::errors::ErrorKind;
use meshcore::model::{ModelDocument, ModelObject, ResolvedReference};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn routing_fixture_validates() {
    let document = ModelDocument::from_path(&fixture("routing.yaml")).unwrap();
    assert_eq!(document.objects.len(), 12);

    let model = document.validate("default", &RegexCache::default()).unwrap();
    assert_eq!(model.namespace, "storefront");
    assert_eq!(model.predicates.len(), 3);
    assert_eq!(model.query_parameters.len(), 1);
    assert_eq!(model.references.len(), 4);
    assert_eq!(model.san_matchers.len(), 1);

    assert_eq!(model.port_mappings["listener"].protocol, PortProtocol::Http2);
    assert!(matches!(model.timeouts["request-timeout"], Timeout::Grpc(_)));
    assert_eq!(model.timeouts["request-timeout"].idle_millis().unwrap(), Some(300_000));
    assert!(matches!(model.connection_pools["upstream-pool"], ConnectionPool::Http2(_)));
}

#[test]
fn routing_fixture_evaluates() {
    let document = ModelDocument::from_path(&fixture("routing.yaml")).unwrap();
    let model = document.validate("default", &RegexCache::default()).unwrap();

    assert_eq!(model.evaluate("api-path", "/api/v2/orders"), Some(true));
    assert_eq!(model.evaluate("api-path", "/static/app.js"), Some(false));
    assert_eq!(model.evaluate("canary-header", "canary"), Some(true));
    assert_eq!(model.evaluate("tenant-metadata", "acme-eu"), Some(true));
    assert_eq!(model.evaluate("debug-param", "anything"), Some(true));

    let peers = ["spiffe://prod/storefront/web"];
    assert_eq!(model.evaluate_san("trusted-peers", &peers), Some(true));
    // Wildcard entries are literal.
    let wildcard = ["api.storefront.svc.cluster.local"];
    assert_eq!(model.evaluate_san("trusted-peers", &wildcard), Some(false));
}

#[test]
fn routing_fixture_resolves_references() {
    let document = ModelDocument::from_path(&fixture("routing.yaml")).unwrap();
    let model = document.validate("default", &RegexCache::default()).unwrap();

    let describe = |name: &str| match &model.references[name] {
        ResolvedReference::Named { identity, .. } => identity.to_string(),
        ResolvedReference::Mesh(bound) => bound.identity.to_string(),
        ResolvedReference::Gateway(bound) => bound.identity.to_string(),
    };

    assert_eq!(describe("checkout"), "storefront/checkout.storefront.svc.cluster.local");
    assert_eq!(describe("payments"), "payments/payments-v2");
    assert_eq!(describe("mesh"), "prod-mesh");
    assert_eq!(describe("edge"), "storefront/edge-gateway");
}

#[test]
fn broken_fixture_reports_every_error() {
    let document = ModelDocument::from_path(&fixture("broken.json")).unwrap();
    let errors = document.validate("default", &RegexCache::default()).unwrap_err();

    let found: Vec<(ErrorKind, &str)> =
        errors.iter().map(|e| (e.kind, e.field.as_str())).collect();
    assert_eq!(
        found,
        vec![
            (ErrorKind::InvariantViolation, "objects[0].spec"),
            (ErrorKind::RangeError, "objects[1].spec.range.end"),
            (ErrorKind::RangeError, "objects[2].spec.port"),
            (ErrorKind::InvariantViolation, "objects[3].spec.maxConnections"),
            (ErrorKind::InvariantViolation, "objects[3].spec.maxPendingRequests"),
            (ErrorKind::RangeError, "objects[4].spec.value"),
            (ErrorKind::InvariantViolation, "objects[5].spec.match.exact"),
            (ErrorKind::SchemaError, "objects[6].spec.uid"),
        ]
    );
    assert!(errors.to_string().starts_with("8 validation error(s)"));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ModelDocument::from_path(&fixture("does-not-exist.yaml")).unwrap_err();
    assert_eq!(err.kind(), None);
    assert!(err.to_string().contains("does-not-exist.yaml"));
}

#[test]
fn yaml_and_json_agree() {
    let yaml = ModelDocument::from_path(&fixture("routing.yaml")).unwrap();
    let json = serde_json::to_string(&yaml).unwrap();
    let reparsed = ModelDocument::from_json_str(&json).unwrap();
    assert_eq!(reparsed, yaml);

    match reparsed.objects[4].decode().unwrap() {
        ModelObject::PortMapping(mapping) => assert_eq!(mapping.port.value(), 8443),
        other => panic!("unexpected object {:?}", other),
    }
}

#[test]
fn malformed_objects_are_collected_not_fatal() {
    let document = ModelDocument::from_yaml_str(
        r#"
namespace: apps
objects:
  - name: edge
    kind: VirtualGatewayReference
    spec: { name: ingress }
  - name: listener
    kind: PortMapping
    spec: { port: 8080, protocol: udp }
  - name: api
    kind: HTTPPathMatch
    spec: { regex: "^/api/" }
"#,
    )
    .unwrap();

    let errors = document.validate("default", &RegexCache::default()).unwrap_err();
    let found: Vec<(ErrorKind, &str)> =
        errors.iter().map(|e| (e.kind, e.field.as_str())).collect();
    assert_eq!(
        found,
        vec![
            (ErrorKind::SchemaError, "objects[0].spec"),
            (ErrorKind::SchemaError, "objects[1].spec.protocol"),
        ]
    );
    assert!(errors.to_string().contains("unknown protocol 'udp'"));
}
