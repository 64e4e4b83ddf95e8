//! Type keys and type lineage.
//!
//! Every runtime value reports a [`TypeInfo`]. Registries keyed by
//! [`TypeKey`] walk the lineage in a fixed order:
//!
//! 1. the exact type key
//! 2. ancestors, nearest first
//! 3. capability tags, own tags before inherited ones, in declaration order
//! 4. the catch-all [`keys::ANY`]
//!
//! The catch-all is not part of [`TypeInfo::lineage`]; registries treat it
//! as their default slot.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a runtime type or capability tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        TypeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(key: &str) -> Self {
        TypeKey::new(key)
    }
}

impl From<String> for TypeKey {
    fn from(key: String) -> Self {
        TypeKey(key)
    }
}

/// Built-in type keys and capability tags.
pub mod keys {
    pub const NULL: &str = "null";
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const FLOAT: &str = "float";
    pub const STRING: &str = "string";
    pub const BYTES: &str = "bytes";
    pub const LIST: &str = "list";
    pub const MAP: &str = "map";

    pub const NUMBER: &str = "number";
    pub const TEXT: &str = "text";
    pub const BINARY: &str = "binary";
    pub const SEQUENCE: &str = "sequence";
    pub const MAPPING: &str = "mapping";
    pub const OBJECT: &str = "object";

    /// Catch-all key, matched when nothing in the lineage is registered.
    pub const ANY: &str = "any";
}

/// Runtime type descriptor: key, optional parent and capability tags.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    key: TypeKey,
    parent: Option<Arc<TypeInfo>>,
    capabilities: Vec<TypeKey>,
}

impl TypeInfo {
    pub fn new(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            parent: None,
            capabilities: Vec::new(),
        }
    }

    /// Object type carrying the `object` capability tag.
    pub fn object(key: impl Into<TypeKey>) -> Self {
        Self::new(key).with_capability(keys::OBJECT)
    }

    pub fn with_parent(mut self, parent: Arc<TypeInfo>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_capability(mut self, tag: impl Into<TypeKey>) -> Self {
        let tag = tag.into();
        if !self.capabilities.contains(&tag) {
            self.capabilities.push(tag);
        }
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn parent(&self) -> Option<&Arc<TypeInfo>> {
        self.parent.as_ref()
    }

    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    /// Iterate this type and its ancestors, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &TypeInfo> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// Lookup order used by type-keyed registries, without duplicates.
    pub fn lineage(&self) -> Vec<TypeKey> {
        let mut order: Vec<TypeKey> = Vec::new();
        for ty in self.ancestry() {
            push_unique(&mut order, &ty.key);
        }
        for ty in self.ancestry() {
            for tag in &ty.capabilities {
                push_unique(&mut order, tag);
            }
        }
        order
    }

    /// True when `key` names this type, an ancestor or a capability tag.
    pub fn is_a(&self, key: &str) -> bool {
        key == keys::ANY
            || self
                .ancestry()
                .any(|t| t.key.as_str() == key || t.capabilities.iter().any(|c| c.as_str() == key))
    }
}

fn push_unique(order: &mut Vec<TypeKey>, key: &TypeKey) {
    if !order.contains(key) {
        order.push(key.clone());
    }
}

// ============================================================================
// Built-in type descriptors
// ============================================================================

fn builtin(key: &str, capability: Option<&str>) -> Arc<TypeInfo> {
    let info = TypeInfo::new(key);
    Arc::new(match capability {
        Some(tag) => info.with_capability(tag),
        None => info,
    })
}

pub(crate) static NULL_TYPE: Lazy<Arc<TypeInfo>> = Lazy::new(|| builtin(keys::NULL, None));
pub(crate) static BOOL_TYPE: Lazy<Arc<TypeInfo>> = Lazy::new(|| builtin(keys::BOOL, None));
pub(crate) static INT_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::INT, Some(keys::NUMBER)));
pub(crate) static FLOAT_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::FLOAT, Some(keys::NUMBER)));
pub(crate) static STRING_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::STRING, Some(keys::TEXT)));
pub(crate) static BYTES_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::BYTES, Some(keys::BINARY)));
pub(crate) static LIST_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::LIST, Some(keys::SEQUENCE)));
pub(crate) static MAP_TYPE: Lazy<Arc<TypeInfo>> =
    Lazy::new(|| builtin(keys::MAP, Some(keys::MAPPING)));
