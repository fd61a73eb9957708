//! Cross-object references
//!
//! Namespace-scoped references default to the referencing object's
//! namespace, which the caller always passes explicitly. Mesh and virtual
//! gateway references additionally carry the UID they were bound to; the
//! resolver surfaces it but leaves staleness decisions to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::Uid;
use crate::errors::{join_field, FieldError, MeshError, Result, ValidationErrors};

/// Fully-qualified identity of a namespaced object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectIdentity {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Identity plus the UID the reference was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BoundIdentity<I> {
    pub identity: I,
    pub uid: Uid,
}

/// Meshes are cluster-scoped; their identity is just the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MeshIdentity(pub String);

impl fmt::Display for MeshIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A by-name reference with an optional namespace.
pub trait NamespacedReference {
    /// Kind of the referenced object, for diagnostics
    const KIND: &'static str;

    fn name(&self) -> &str;

    fn namespace(&self) -> Option<&str>;

    /// Resolve against the namespace of the referencing object
    fn resolve(&self, referencing_namespace: &str) -> Result<ObjectIdentity> {
        resolve(self, referencing_namespace)
    }

    fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_name(Self::KIND, self.name(), field, errors);
        if let Some(namespace) = self.namespace() {
            if namespace.is_empty() {
                errors.push(FieldError::schema(
                    join_field(field, "namespace"),
                    "must not be empty when set",
                ));
            }
        }
    }
}

fn check_name(kind: &str, name: &str, field: &str, errors: &mut ValidationErrors) {
    if name.is_empty() {
        errors.push(FieldError::schema(
            join_field(field, "name"),
            format!("{} reference name must not be empty", kind),
        ));
    }
}

/// A lone error stays a field-scoped error; several become a report.
fn into_error(errors: ValidationErrors) -> MeshError {
    if errors.len() > 1 {
        return MeshError::Validation(errors);
    }
    errors
        .into_iter()
        .next()
        .map(MeshError::from)
        .unwrap_or_else(|| MeshError::schema("invalid reference"))
}

/// `(namespace, name)` for `reference`, defaulting the namespace to
/// `referencing_namespace`.
pub fn resolve<R: NamespacedReference + ?Sized>(
    reference: &R,
    referencing_namespace: &str,
) -> Result<ObjectIdentity> {
    let mut errors = ValidationErrors::new();
    reference.collect_errors("", &mut errors);
    if !errors.is_empty() {
        return Err(into_error(errors));
    }

    let namespace = reference.namespace().unwrap_or(referencing_namespace);
    if namespace.is_empty() {
        return Err(MeshError::schema_field(
            format!("no namespace to resolve {} '{}' in", R::KIND, reference.name()),
            "namespace",
        ));
    }

    Ok(ObjectIdentity { namespace: namespace.to_string(), name: reference.name().to_string() })
}

macro_rules! namespaced_reference {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            /// Defaults to the referencing object's namespace
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub namespace: Option<String>,

            pub name: String,
        }

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self { namespace: None, name: name.into() }
            }

            pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
                self.namespace = Some(namespace.into());
                self
            }
        }

        impl NamespacedReference for $name {
            const KIND: &'static str = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn namespace(&self) -> Option<&str> {
                self.namespace.as_deref()
            }
        }
    };
}

namespaced_reference!(
    /// Reference to a VirtualNode
    VirtualNodeReference,
    "VirtualNode"
);

namespaced_reference!(
    /// Reference to a VirtualService
    VirtualServiceReference,
    "VirtualService"
);

namespaced_reference!(
    /// Reference to a VirtualRouter
    VirtualRouterReference,
    "VirtualRouter"
);

/// Reference to a Mesh, bound to its UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshReference {
    pub name: String,
    pub uid: Uid,
}

impl MeshReference {
    pub fn new(name: impl Into<String>, uid: impl Into<Uid>) -> Self {
        Self { name: name.into(), uid: uid.into() }
    }

    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_name("Mesh", &self.name, field, errors);
        check_uid(&self.uid, field, errors);
    }

    pub fn resolve(&self) -> Result<BoundIdentity<MeshIdentity>> {
        let mut errors = ValidationErrors::new();
        self.collect_errors("", &mut errors);
        if !errors.is_empty() {
            return Err(into_error(errors));
        }
        Ok(BoundIdentity { identity: MeshIdentity(self.name.clone()), uid: self.uid.clone() })
    }
}

/// Reference to a VirtualGateway, bound to its UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualGatewayReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub name: String,

    pub uid: Uid,
}

impl VirtualGatewayReference {
    pub fn new(name: impl Into<String>, uid: impl Into<Uid>) -> Self {
        Self { namespace: None, name: name.into(), uid: uid.into() }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn resolve_bound(
        &self,
        referencing_namespace: &str,
    ) -> Result<BoundIdentity<ObjectIdentity>> {
        let identity = resolve(self, referencing_namespace)?;
        Ok(BoundIdentity { identity, uid: self.uid.clone() })
    }
}

impl NamespacedReference for VirtualGatewayReference {
    const KIND: &'static str = "VirtualGateway";

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        check_name(Self::KIND, &self.name, field, errors);
        if matches!(self.namespace.as_deref(), Some("")) {
            errors.push(FieldError::schema(
                join_field(field, "namespace"),
                "must not be empty when set",
            ));
        }
        check_uid(&self.uid, field, errors);
    }
}

fn check_uid(uid: &Uid, field: &str, errors: &mut ValidationErrors) {
    if uid.is_empty() {
        errors.push(FieldError::schema(join_field(field, "uid"), "must not be empty"));
    }
}
