//! Textual encodings of structured documents.
//!
//! - `compact`: single-line JSON, keys in insertion order
//! - `indented`: YAML block style, 2-space indentation, strings quoted only
//!   where YAML requires it

use cellbridge_core::{ConversionError, Document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Compact,
    #[default]
    Indented,
}

impl TextFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormat::Compact => "compact",
            TextFormat::Indented => "indented",
        }
    }

    /// Mime type of text produced in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            TextFormat::Compact => "application/json",
            TextFormat::Indented => "application/yaml",
        }
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "json" => Ok(TextFormat::Compact),
            "indented" | "yaml" | "yml" => Ok(TextFormat::Indented),
            other => Err(format!("unknown text format `{}`", other)),
        }
    }
}

/// Serialize a document in the given format.
pub fn encode(doc: &Document, format: TextFormat) -> Result<String, ConversionError> {
    match format {
        TextFormat::Compact => {
            serde_json::to_string(doc).map_err(|e| ConversionError::Serialize(e.to_string()))
        }
        TextFormat::Indented => {
            serde_yaml::to_string(doc).map_err(|e| ConversionError::Serialize(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbridge_core::DocumentMap;

    fn sample() -> Document {
        let mut inner = DocumentMap::new();
        inner.insert("name", Document::string("plain"));
        inner.insert("reserved", Document::string("true"));
        inner.insert("padded", Document::string(" x "));
        inner.insert("punct", Document::string("a: b"));

        let mut root = DocumentMap::new();
        root.insert("count", Document::int(2));
        root.insert(
            "items",
            Document::List(vec![Document::Bool(true), Document::Null]),
        );
        root.insert("inner", Document::Map(inner));
        Document::Map(root)
    }

    #[test]
    fn test_compact_is_single_line() {
        let text = encode(&sample(), TextFormat::Compact).unwrap();
        assert!(!text.contains('\n'));
        assert!(text.starts_with(r#"{"count":2,"items":[true,null],"inner":"#));
    }

    #[test]
    fn test_indented_block_style() {
        let text = encode(&sample(), TextFormat::Indented).unwrap();
        assert!(text.contains("count: 2\n"));
        assert!(text.contains("items:\n- true\n- null\n"));
        assert!(text.contains("inner:\n  name: plain\n"));
    }

    #[test]
    fn test_indented_quotes_only_when_required() {
        let text = encode(&sample(), TextFormat::Indented).unwrap();
        assert!(text.contains("name: plain\n"));
        assert!(!text.contains("name: 'plain'"));
        assert!(text.contains("reserved: 'true'"));
        assert!(text.contains("padded: ' x '"));
        assert!(text.contains("punct: 'a: b'"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<TextFormat>(), Ok(TextFormat::Compact));
        assert_eq!("YAML".parse::<TextFormat>(), Ok(TextFormat::Indented));
        assert!("xml".parse::<TextFormat>().is_err());
    }
}
