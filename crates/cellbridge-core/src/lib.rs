//! cellbridge core: runtime values, type lineage and structured documents.
//!
//! Shared by the converter, the render registry and the execution context.

pub mod document;
pub mod error;
pub mod registry;
pub mod types;
pub mod value;

pub use document::{Document, DocumentMap, CIRCULAR_SENTINEL};
pub use error::ConversionError;
pub use registry::TypeRegistry;
pub use types::{keys, TypeInfo, TypeKey};
pub use value::{HostValue, Object, ObjectRef, Structurable, Value, ValueEncoder};
