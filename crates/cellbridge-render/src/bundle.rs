//! Mime bundles: the rendered form of a value.
//!
//! A bundle maps mime types to payloads and keeps per-mime metadata. It
//! serializes to the notebook `{"data": {...}, "metadata": {...}}` shape,
//! with binary payloads base64 encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_GIF: &str = "image/gif";

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Json),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Payload::Text(s) => Json::String(s.clone()),
            Payload::Json(v) => v.clone(),
            Payload::Bytes(b) => Json::String(BASE64.encode(b)),
        }
    }
}

/// Rendered output of a value, one payload per mime type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedOutput {
    data: Vec<(String, Payload)>,
    metadata: Vec<(String, Map<String, Json>)>,
}

impl RenderedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding a single text/plain payload.
    pub fn text(text: impl Into<String>) -> Self {
        let mut out = Self::new();
        out.insert(TEXT_PLAIN, Payload::Text(text.into()));
        out
    }

    pub fn has(&self, mime: &str) -> bool {
        self.data.iter().any(|(m, _)| m == mime)
    }

    pub fn get(&self, mime: &str) -> Option<&Payload> {
        self.data.iter().find(|(m, _)| m == mime).map(|(_, p)| p)
    }

    /// Insert or replace the payload for `mime`.
    pub fn insert(&mut self, mime: impl Into<String>, payload: Payload) {
        let mime = mime.into();
        match self.data.iter_mut().find(|(m, _)| *m == mime) {
            Some(slot) => slot.1 = payload,
            None => self.data.push((mime, payload)),
        }
    }

    /// Insert unless a payload for `mime` exists; first writer wins.
    pub fn insert_if_absent(&mut self, mime: impl Into<String>, payload: Payload) -> bool {
        let mime = mime.into();
        if self.has(&mime) {
            return false;
        }
        self.data.push((mime, payload));
        true
    }

    /// Metadata object for `mime`, created on first use.
    pub fn metadata_mut(&mut self, mime: &str) -> &mut Map<String, Json> {
        let index = match self.metadata.iter().position(|(m, _)| m == mime) {
            Some(index) => index,
            None => {
                self.metadata.push((mime.to_string(), Map::new()));
                self.metadata.len() - 1
            }
        };
        &mut self.metadata[index].1
    }

    pub fn metadata(&self, mime: &str) -> Option<&Map<String, Json>> {
        self.metadata.iter().find(|(m, _)| m == mime).map(|(_, meta)| meta)
    }

    /// The text/plain payload, if any.
    pub fn plain_text(&self) -> Option<&str> {
        self.get(TEXT_PLAIN).and_then(Payload::as_text)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|(m, _)| m.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy payloads and metadata for mime types not already present.
    pub fn merge_absent(&mut self, other: RenderedOutput) {
        let RenderedOutput { data, metadata } = other;
        for (mime, payload) in data {
            if self.insert_if_absent(mime.clone(), payload) {
                if let Some((_, meta)) = metadata.iter().find(|(m, _)| *m == mime) {
                    self.metadata_mut(&mime).extend(meta.clone());
                }
            }
        }
    }

    /// True if this bundle is an error artifact produced by the registry.
    pub fn is_error(&self) -> bool {
        self.metadata(TEXT_PLAIN)
            .and_then(|m| m.get("error"))
            .and_then(Json::as_bool)
            .unwrap_or(false)
    }

    pub fn to_json(&self) -> Json {
        let data: Map<String, Json> = self
            .data
            .iter()
            .map(|(mime, payload)| (mime.clone(), payload.to_json()))
            .collect();
        let metadata: Map<String, Json> = self
            .metadata
            .iter()
            .map(|(mime, meta)| (mime.clone(), Json::Object(meta.clone())))
            .collect();
        json!({
            "data": data,
            "metadata": metadata,
        })
    }
}

impl Serialize for RenderedOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
