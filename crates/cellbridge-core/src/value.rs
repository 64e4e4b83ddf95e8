//! Host-side runtime values handed over by the embedded interpreter.
//!
//! Objects are shared and identity-bearing ([`ObjectRef`]) so user code can
//! build self-referential graphs. Host types that live outside this model
//! plug in through [`HostValue`].

use crate::document::Document;
use crate::error::ConversionError;
use crate::types::{
    TypeInfo, BOOL_TYPE, BYTES_TYPE, FLOAT_TYPE, INT_TYPE, LIST_TYPE, MAP_TYPE, NULL_TYPE,
    STRING_TYPE,
};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers beyond `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Key-value pairs in insertion order.
    Map(Vec<(Value, Value)>),
    Object(ObjectRef),
    Native(Arc<dyn HostValue>),
}

impl Value {
    pub fn type_info(&self) -> Arc<TypeInfo> {
        match self {
            Value::Null => NULL_TYPE.clone(),
            Value::Bool(_) => BOOL_TYPE.clone(),
            Value::Int(_) | Value::UInt(_) => INT_TYPE.clone(),
            Value::Float(_) => FLOAT_TYPE.clone(),
            Value::Str(_) => STRING_TYPE.clone(),
            Value::Bytes(_) => BYTES_TYPE.clone(),
            Value::List(_) => LIST_TYPE.clone(),
            Value::Map(_) => MAP_TYPE.clone(),
            Value::Object(obj) => obj.type_info().clone(),
            Value::Native(host) => host.type_info(),
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Build a map value from string keys.
    pub fn map<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (Value::Str(k.into()), v))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::UInt(n) => write!(f, "UInt({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(pairs) => f.debug_tuple("Map").field(pairs).finish(),
            Value::Object(obj) => write!(f, "{obj:?}"),
            Value::Native(host) => write!(f, "Native({})", host.describe()),
        }
    }
}

/// Generic to-text stringification. Used whenever a plain-text form is
/// required and no renderer supplied one.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_nested(f, item)?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_nested(f, k)?;
                    f.write_str(": ")?;
                    write_nested(f, v)?;
                }
                f.write_str("}")
            }
            // Fields are not followed: the graph may be cyclic.
            Value::Object(obj) => write!(f, "<{}>", obj.type_info().key()),
            Value::Native(host) => f.write_str(&host.describe()),
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "{s:?}"),
        other => write!(f, "{other}"),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::UInt(n),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::UInt(u),
                (None, None) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Objects
// ============================================================================

/// Object with a type descriptor and an ordered, mutable field list.
pub struct Object {
    type_info: Arc<TypeInfo>,
    fields: RwLock<Vec<(String, Value)>>,
}

/// Shared handle to an [`Object`]. Clones share identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    pub fn new(type_info: Arc<TypeInfo>) -> Self {
        ObjectRef(Arc::new(Object {
            type_info,
            fields: RwLock::new(Vec::new()),
        }))
    }

    pub fn with_fields<K, I>(type_info: Arc<TypeInfo>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let obj = Self::new(type_info);
        for (name, value) in fields {
            obj.set(name, value);
        }
        obj
    }

    pub fn type_info(&self) -> &Arc<TypeInfo> {
        &self.0.type_info
    }

    /// Set a field, replacing an existing one in place.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut fields = self.0.fields.write().unwrap_or_else(|e| e.into_inner());
        match fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let fields = self.0.fields.read().unwrap_or_else(|e| e.into_inner());
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    /// Snapshot of the fields in declaration order.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.0
            .fields
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drop every field. Breaks reference cycles held through this object.
    pub fn clear(&self) {
        self.0
            .fields
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Identity of the underlying object.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}@{:#x})", self.type_info().key(), self.id())
    }
}

// ============================================================================
// Host values
// ============================================================================

/// Recursive encoder handed to [`Structurable`] implementations so nested
/// values go through the same cycle and depth tracking as the caller.
pub trait ValueEncoder {
    fn encode(&mut self, value: &Value) -> Result<Document, ConversionError>;
}

/// Explicit conversion to a structured document.
pub trait Structurable {
    fn to_structured(&self, encoder: &mut dyn ValueEncoder) -> Result<Document, ConversionError>;
}

/// A host type exposed to user code as an opaque value.
pub trait HostValue: Send + Sync {
    fn type_info(&self) -> Arc<TypeInfo>;

    /// Plain-text form.
    fn describe(&self) -> String {
        format!("<{}>", self.type_info().key())
    }

    fn as_structurable(&self) -> Option<&dyn Structurable> {
        None
    }

    /// Field enumeration used when the value is not [`Structurable`].
    fn fields(&self) -> Option<Vec<(String, Value)>> {
        None
    }
}
