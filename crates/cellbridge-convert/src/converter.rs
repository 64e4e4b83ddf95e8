//! Value → structured document conversion.
//!
//! Dispatch order for every value:
//! 1. a custom converter registered along the value's type lineage
//! 2. built-in mapping for primitives, sequences and maps
//! 3. [`Structurable`](cellbridge_core::Structurable) for host values that implement it
//! 4. the field enumeration fallback in [`crate::introspect`]
//!
//! Objects and host values currently on the conversion path are tracked by
//! identity; one that reappears becomes [`Document::Circular`].

use crate::introspect::{introspect, Introspected};
use crate::text::{self, TextFormat};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cellbridge_core::{
    ConversionError, Document, DocumentMap, TypeKey, TypeRegistry, Value, ValueEncoder,
};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Custom conversion for a type key.
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        value: &Value,
        encoder: &mut dyn ValueEncoder,
    ) -> Result<Document, ConversionError>;
}

struct FnConverter<F>(F);

impl<F> Converter for FnConverter<F>
where
    F: Fn(&Value, &mut dyn ValueEncoder) -> Result<Document, ConversionError> + Send + Sync,
{
    fn convert(
        &self,
        value: &Value,
        encoder: &mut dyn ValueEncoder,
    ) -> Result<Document, ConversionError> {
        (self.0)(value, encoder)
    }
}

pub struct StructuredConverter {
    converters: RwLock<TypeRegistry<Arc<dyn Converter>>>,
    max_depth: usize,
}

impl Default for StructuredConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredConverter {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            converters: RwLock::new(TypeRegistry::new()),
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Register a custom converter; returns the one it replaced.
    pub fn register<C>(&self, key: impl Into<TypeKey>, converter: C) -> Option<Arc<dyn Converter>>
    where
        C: Converter + 'static,
    {
        let key = key.into();
        debug!(type_key = %key, "registering converter");
        self.converters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .register(key, Arc::new(converter))
    }

    /// Register a closure as a custom converter.
    pub fn register_fn<F>(&self, key: impl Into<TypeKey>, f: F) -> Option<Arc<dyn Converter>>
    where
        F: Fn(&Value, &mut dyn ValueEncoder) -> Result<Document, ConversionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(key, FnConverter(f))
    }

    pub fn unregister(&self, key: &TypeKey) -> Option<Arc<dyn Converter>> {
        self.converters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .unregister(key)
    }

    pub fn to_structured(&self, value: &Value) -> Result<Document, ConversionError> {
        Walk {
            converter: self,
            path: HashSet::new(),
            depth: 0,
        }
        .encode(value)
    }

    /// Convert and return the host-native JSON value.
    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value, ConversionError> {
        self.to_structured(value).map(|doc| doc.to_json())
    }

    pub fn to_text(&self, value: &Value, format: TextFormat) -> Result<String, ConversionError> {
        let doc = self.to_structured(value)?;
        text::encode(&doc, format)
    }

    // The read guard is released before the converter runs, so converters
    // may recurse into values that hit the registry again.
    fn custom_for(&self, value: &Value) -> Option<Arc<dyn Converter>> {
        let registry = self.converters.read().unwrap_or_else(|e| e.into_inner());
        if registry.is_empty() {
            return None;
        }
        registry
            .lookup(&value.type_info())
            .map(|(_, converter)| converter.clone())
    }
}

/// Per-call conversion state.
struct Walk<'a> {
    converter: &'a StructuredConverter,
    path: HashSet<usize>,
    depth: usize,
}

impl ValueEncoder for Walk<'_> {
    fn encode(&mut self, value: &Value) -> Result<Document, ConversionError> {
        if self.depth >= self.converter.max_depth {
            return Err(ConversionError::DepthExceeded {
                limit: self.converter.max_depth,
            });
        }

        let identity = identity(value);
        if let Some(id) = identity {
            if !self.path.insert(id) {
                trace!(type_key = %value.type_info().key(), "circular reference");
                return Ok(Document::Circular);
            }
        }

        self.depth += 1;
        let result = self.dispatch(value);
        self.depth -= 1;

        if let Some(id) = identity {
            self.path.remove(&id);
        }
        result
    }
}

impl Walk<'_> {
    fn dispatch(&mut self, value: &Value) -> Result<Document, ConversionError> {
        if let Some(custom) = self.converter.custom_for(value) {
            return custom.convert(value, self);
        }

        match value {
            Value::Null => Ok(Document::Null),
            Value::Bool(b) => Ok(Document::Bool(*b)),
            Value::Int(n) => Ok(Document::int(*n)),
            Value::UInt(n) => Ok(Document::Number((*n).into())),
            Value::Float(x) => Document::float(*x),
            Value::Str(s) => Ok(Document::String(s.clone())),
            Value::Bytes(bytes) => Ok(Document::String(BASE64.encode(bytes))),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.encode(item)?);
                }
                Ok(Document::List(out))
            }
            Value::Map(pairs) => {
                let mut map = DocumentMap::new();
                for (k, v) in pairs {
                    map.insert(key_string(k), self.encode(v)?);
                }
                Ok(Document::Map(map))
            }
            Value::Native(host) => match host.as_structurable() {
                Some(structurable) => structurable.to_structured(self),
                None => self.fallback(value),
            },
            Value::Object(_) => self.fallback(value),
        }
    }

    fn fallback(&mut self, value: &Value) -> Result<Document, ConversionError> {
        match introspect(value) {
            Introspected::Fields(fields) => {
                let mut map = DocumentMap::new();
                for (name, field) in &fields {
                    map.insert(name.clone(), self.encode(field)?);
                }
                Ok(Document::Map(map))
            }
            Introspected::Opaque(text) => Ok(Document::String(text)),
        }
    }
}

fn identity(value: &Value) -> Option<usize> {
    match value {
        Value::Object(obj) => Some(obj.id()),
        Value::Native(host) => Some(Arc::as_ptr(host) as *const () as usize),
        _ => None,
    }
}

/// Map keys are coerced to strings.
fn key_string(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}
