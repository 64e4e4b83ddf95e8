//! Built-in renderers.
//!
//! | Renderer | Registered for | Produces |
//! |---|---|---|
//! | [`TextRenderer`] | `string` | text/plain |
//! | [`JsonRenderer`] | `mapping`, `sequence`, `object` | application/json (expanded) + text/plain |
//! | [`ImageRenderer`] | `bytes` | image/png, image/jpeg or image/gif, base64 |
//! | [`DefaultRenderer`] | catch-all | text/plain |

use crate::bundle::{
    Payload, RenderedOutput, APPLICATION_JSON, IMAGE_GIF, IMAGE_JPEG, IMAGE_PNG, TEXT_PLAIN,
};
use crate::renderer::{RenderError, Renderer};
use cellbridge_convert::StructuredConverter;
use cellbridge_core::Value;
use serde_json::json;
use std::sync::Arc;

/// String values as text/plain.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        "text"
    }

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError> {
        let text = value
            .as_str()
            .ok_or_else(|| RenderError::unexpected("string", value))?;
        bundle.insert_if_absent(TEXT_PLAIN, Payload::Text(text.to_string()));
        Ok(())
    }
}

/// Structured values as an expanded JSON tree.
pub struct JsonRenderer {
    converter: Arc<StructuredConverter>,
}

impl JsonRenderer {
    pub fn new(converter: Arc<StructuredConverter>) -> Self {
        Self { converter }
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError> {
        let tree = self.converter.to_json(value)?;
        if !bundle.has(TEXT_PLAIN) {
            let pretty = serde_json::to_string_pretty(&tree)
                .map_err(|e| RenderError::Failed(e.to_string()))?;
            bundle.insert(TEXT_PLAIN, Payload::Text(pretty));
        }
        if bundle.insert_if_absent(APPLICATION_JSON, Payload::Json(tree)) {
            bundle
                .metadata_mut(APPLICATION_JSON)
                .insert("expanded".to_string(), json!(true));
        }
        Ok(())
    }
}

/// Byte buffers carrying a PNG, JPEG or GIF signature.
///
/// Declines (writes nothing) for bytes it does not recognise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRenderer;

impl Renderer for ImageRenderer {
    fn name(&self) -> &str {
        "image"
    }

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError> {
        let bytes = match value {
            Value::Bytes(bytes) => bytes,
            other => return Err(RenderError::unexpected("bytes", other)),
        };
        let Some(info) = sniff(bytes) else {
            return Ok(());
        };
        if bundle.insert_if_absent(info.mime, Payload::Bytes(bytes.clone())) {
            let meta = bundle.metadata_mut(info.mime);
            if let Some((width, height)) = info.size {
                meta.insert("width".to_string(), json!(width));
                meta.insert("height".to_string(), json!(height));
            }
        }
        Ok(())
    }
}

/// Catch-all: generic stringification.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn name(&self) -> &str {
        "default"
    }

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError> {
        bundle.insert_if_absent(TEXT_PLAIN, Payload::Text(value.to_string()));
        Ok(())
    }
}

// ============================================================================
// Image sniffing
// ============================================================================

#[derive(Debug, PartialEq)]
pub(crate) struct ImageInfo {
    pub mime: &'static str,
    pub size: Option<(u32, u32)>,
}

pub(crate) fn sniff(bytes: &[u8]) -> Option<ImageInfo> {
    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    if bytes.starts_with(PNG_SIGNATURE) {
        let size = (bytes.len() >= 24 && &bytes[12..16] == b"IHDR")
            .then(|| (be_u32(&bytes[16..20]), be_u32(&bytes[20..24])));
        return Some(ImageInfo { mime: IMAGE_PNG, size });
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let size = (bytes.len() >= 10).then(|| {
            (
                u32::from(u16::from_le_bytes([bytes[6], bytes[7]])),
                u32::from(u16::from_le_bytes([bytes[8], bytes[9]])),
            )
        });
        return Some(ImageInfo { mime: IMAGE_GIF, size });
    }
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some(ImageInfo {
            mime: IMAGE_JPEG,
            size: jpeg_size(bytes),
        });
    }
    None
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn be_u16(b: &[u8]) -> u32 {
    u32::from(u16::from_be_bytes([b[0], b[1]]))
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 9 <= bytes.len() {
        if bytes[i] != 0xff {
            return None;
        }
        match bytes[i + 1] {
            0xff => i += 1,
            0x01 | 0xd0..=0xd8 => i += 2,
            0xc0..=0xcf if !matches!(bytes[i + 1], 0xc4 | 0xc8 | 0xcc) => {
                let height = be_u16(&bytes[i + 5..i + 7]);
                let width = be_u16(&bytes[i + 7..i + 9]);
                return Some((width, height));
            }
            _ => i += 2 + be_u16(&bytes[i + 2..i + 4]) as usize,
        }
    }
    None
}
