//! Structured documents: the format-agnostic tree JSON and YAML text is
//! produced from.

use crate::error::ConversionError;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Text written in place of a [`Document::Circular`] node.
pub const CIRCULAR_SENTINEL: &str = "<circular-reference>";

/// Structured document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Document>),
    Map(DocumentMap),
    /// A value that reappeared on its own conversion path.
    Circular,
}

impl Document {
    pub fn int(n: i64) -> Self {
        Document::Number(n.into())
    }

    /// Finite floats only; NaN and infinities have no structured encoding.
    pub fn float(x: f64) -> Result<Self, ConversionError> {
        serde_json::Number::from_f64(x)
            .map(Document::Number)
            .ok_or(ConversionError::UnsupportedNumber(x))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Document::String(s.into())
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, Document::Circular)
    }

    /// True if any node in the tree is a circular-reference sentinel.
    pub fn contains_circular(&self) -> bool {
        match self {
            Document::Circular => true,
            Document::List(items) => items.iter().any(Document::contains_circular),
            Document::Map(map) => map.values().any(Document::contains_circular),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Host-native form. The sentinel becomes [`CIRCULAR_SENTINEL`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Document::Null => serde_json::Value::Null,
            Document::Bool(b) => serde_json::Value::Bool(*b),
            Document::Number(n) => serde_json::Value::Number(n.clone()),
            Document::String(s) => serde_json::Value::String(s.clone()),
            Document::List(items) => {
                serde_json::Value::Array(items.iter().map(Document::to_json).collect())
            }
            Document::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Document::Circular => serde_json::Value::String(CIRCULAR_SENTINEL.to_string()),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Bool(*b),
            serde_json::Value::Number(n) => Document::Number(n.clone()),
            serde_json::Value::String(s) => Document::String(s.clone()),
            serde_json::Value::Array(items) => {
                Document::List(items.iter().map(Document::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut doc = DocumentMap::new();
                for (k, v) in map {
                    doc.insert(k.clone(), Document::from_json(v));
                }
                Document::Map(doc)
            }
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Number(n) => n.serialize(serializer),
            Document::String(s) => serializer.serialize_str(s),
            Document::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Document::Circular => serializer.serialize_str(CIRCULAR_SENTINEL),
        }
    }
}

/// String-keyed map that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMap {
    entries: Vec<(String, Document)>,
}

impl DocumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, overwriting an existing key in its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Document) -> Option<Document> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>> FromIterator<(K, Document)> for DocumentMap {
    fn from_iter<I: IntoIterator<Item = (K, Document)>>(iter: I) -> Self {
        let mut map = DocumentMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(Document::float(1.25).is_ok());
        assert_eq!(
            Document::float(f64::NAN).unwrap_err().to_string(),
            ConversionError::UnsupportedNumber(f64::NAN).to_string()
        );
        assert!(Document::float(f64::INFINITY).is_err());
    }

    #[test]
    fn test_map_insert_keeps_position() {
        let mut map = DocumentMap::new();
        map.insert("b", Document::int(1));
        map.insert("a", Document::int(2));
        let previous = map.insert("b", Document::int(3));
        assert_eq!(previous, Some(Document::int(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&Document::int(3)));
    }

    #[test]
    fn test_json_bridge_preserves_order() {
        let json = json!({"z": 1, "a": [true, null, "s"]});
        let doc = Document::from_json(&json);
        assert_eq!(doc.to_json(), json);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"z":1,"a":[true,null,"s"]}"#);
    }

    #[test]
    fn test_circular_serializes_as_sentinel() {
        let doc = Document::List(vec![Document::Circular]);
        assert!(doc.contains_circular());
        assert_eq!(doc.to_json(), json!([CIRCULAR_SENTINEL]));
    }
}
