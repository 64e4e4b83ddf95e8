//! cellbridge-render: type-keyed renderers producing mime bundles.
//!
//! # Example
//!
//! ```
//! use cellbridge_convert::StructuredConverter;
//! use cellbridge_core::Value;
//! use cellbridge_render::RenderRegistry;
//! use std::sync::Arc;
//!
//! let registry = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new()));
//! let bundle = registry.render(&Value::from("hello"));
//! assert_eq!(bundle.plain_text(), Some("hello"));
//! ```

pub mod builtin;
pub mod bundle;
pub mod registry;
pub mod renderer;

pub use builtin::{DefaultRenderer, ImageRenderer, JsonRenderer, TextRenderer};
pub use bundle::{Payload, RenderedOutput};
pub use registry::{RenderRegistry, SharedRenderRegistry};
pub use renderer::{FnRenderer, RenderError, Renderer};
