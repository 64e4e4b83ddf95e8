//! cellbridge-convert: runtime values to structured documents and text.
//!
//! # Example
//!
//! ```
//! use cellbridge_convert::{StructuredConverter, TextFormat};
//! use cellbridge_core::Value;
//!
//! let converter = StructuredConverter::new();
//! let value = Value::map([("a", Value::Int(1))]);
//! assert_eq!(converter.to_text(&value, TextFormat::Compact).unwrap(), r#"{"a":1}"#);
//! assert_eq!(converter.to_text(&value, TextFormat::Indented).unwrap(), "a: 1\n");
//! ```

pub mod converter;
mod introspect;
pub mod text;

pub use converter::{Converter, StructuredConverter, DEFAULT_MAX_DEPTH};
pub use text::{encode, TextFormat};
