//! Render registry: type key → renderer, with a catch-all default.
//!
//! Resolution walks the value's lineage (exact key, ancestors nearest
//! first, capability tags) and ends at the default renderer, so it always
//! yields a renderer. Rendering never fails: an error or panic inside a
//! renderer turns into an error artifact in the bundle.

use crate::builtin::{DefaultRenderer, ImageRenderer, JsonRenderer, TextRenderer};
use crate::bundle::{Payload, RenderedOutput, TEXT_PLAIN};
use crate::renderer::{RenderError, Renderer};
use cellbridge_convert::StructuredConverter;
use cellbridge_core::{keys, TypeKey, TypeRegistry, Value};
use std::any::Any;
use std::error::Error as _;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Registry shared across concurrently running sessions.
pub type SharedRenderRegistry = Arc<RwLock<RenderRegistry>>;

pub struct RenderRegistry {
    renderers: TypeRegistry<Arc<dyn Renderer>>,
    fallback: Arc<dyn Renderer>,
}

impl Default for RenderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderRegistry {
    /// Empty registry; everything renders through [`DefaultRenderer`].
    pub fn new() -> Self {
        Self {
            renderers: TypeRegistry::new(),
            fallback: Arc::new(DefaultRenderer),
        }
    }

    /// Registry with the built-in renderers installed.
    pub fn with_defaults(converter: Arc<StructuredConverter>) -> Self {
        let mut registry = Self::new();
        let json: Arc<dyn Renderer> = Arc::new(JsonRenderer::new(converter));
        registry.register(keys::STRING, Arc::new(TextRenderer));
        registry.register(keys::BYTES, Arc::new(ImageRenderer));
        registry.register(keys::MAPPING, json.clone());
        registry.register(keys::SEQUENCE, json.clone());
        registry.register(keys::OBJECT, json);
        registry
    }

    pub fn shared(self) -> SharedRenderRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Register `renderer` for `key`; returns the renderer it replaced.
    pub fn register(
        &mut self,
        key: impl Into<TypeKey>,
        renderer: Arc<dyn Renderer>,
    ) -> Option<Arc<dyn Renderer>> {
        let key = key.into();
        debug!(type_key = %key, renderer = renderer.name(), "registering renderer");
        self.renderers.register(key, renderer)
    }

    pub fn unregister(&mut self, key: &TypeKey) -> Option<Arc<dyn Renderer>> {
        self.renderers.unregister(key)
    }

    /// Replace the catch-all renderer.
    pub fn set_fallback(&mut self, renderer: Arc<dyn Renderer>) {
        self.fallback = renderer;
    }

    pub fn fallback(&self) -> &Arc<dyn Renderer> {
        &self.fallback
    }

    pub fn keys(&self) -> Vec<&TypeKey> {
        self.renderers.keys()
    }

    /// Renderer for `value`; the default when nothing in its lineage is registered.
    pub fn resolve(&self, value: &Value) -> Arc<dyn Renderer> {
        self.resolve_keyed(value).1
    }

    /// Renderer for `value` together with the key it matched (`any` for the default).
    ///
    /// Host values that can produce their own structured form resolve like
    /// objects when nothing in their lineage is registered.
    pub fn resolve_keyed(&self, value: &Value) -> (TypeKey, Arc<dyn Renderer>) {
        if let Some((key, renderer)) = self.renderers.lookup(&value.type_info()) {
            return (key, renderer.clone());
        }
        if is_structurable(value) {
            let key = TypeKey::new(keys::OBJECT);
            if let Some(renderer) = self.renderers.get(&key) {
                return (key, renderer.clone());
            }
        }
        (TypeKey::new(keys::ANY), self.fallback.clone())
    }

    pub fn render(&self, value: &Value) -> RenderedOutput {
        self.render_with_alternates(value, &[])
    }

    /// Render `value`, then each alternate into the same bundle. Earlier
    /// representations win on mime-type clashes.
    pub fn render_with_alternates(&self, value: &Value, alternates: &[Value]) -> RenderedOutput {
        let mut bundle = RenderedOutput::new();
        self.render_into(&mut bundle, value);
        for alternate in alternates.iter().filter(|v| !v.is_null()) {
            self.render_into(&mut bundle, alternate);
        }
        bundle
    }

    fn render_into(&self, bundle: &mut RenderedOutput, value: &Value) {
        let (key, renderer) = self.resolve_keyed(value);
        match invoke(renderer.as_ref(), value) {
            Ok(part) if !part.is_empty() => bundle.merge_absent(part),
            Ok(_) => match invoke(self.fallback.as_ref(), value) {
                Ok(part) => bundle.merge_absent(part),
                Err(failure) => {
                    bundle.merge_absent(error_artifact(self.fallback.as_ref(), value, &failure))
                }
            },
            Err(failure) => {
                warn!(
                    type_key = %value.type_info().key(),
                    matched = %key,
                    renderer = renderer.name(),
                    error = %failure,
                    "renderer failed, emitting error artifact"
                );
                bundle.merge_absent(error_artifact(renderer.as_ref(), value, &failure));
            }
        }
    }
}

fn is_structurable(value: &Value) -> bool {
    matches!(value, Value::Native(host) if host.as_structurable().is_some())
}

/// Why a renderer produced nothing usable.
enum Failure {
    Error(RenderError),
    Panic(String),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Error(e) => write!(f, "{e}"),
            Failure::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// Run a renderer against a scratch bundle so partial writes from a failed
/// render never reach the caller's bundle.
fn invoke(renderer: &dyn Renderer, value: &Value) -> Result<RenderedOutput, Failure> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut scratch = RenderedOutput::new();
        renderer.render_to(&mut scratch, value).map(|()| scratch)
    }));
    match outcome {
        Ok(Ok(bundle)) => Ok(bundle),
        Ok(Err(e)) => Err(Failure::Error(e)),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn error_artifact(renderer: &dyn Renderer, value: &Value, failure: &Failure) -> RenderedOutput {
    let mut lines = vec![format!(
        "error: renderer `{}` could not render a value of type `{}`",
        renderer.name(),
        value.type_info().key()
    )];
    lines.push(format!("  {failure}"));
    if let Failure::Error(e) = failure {
        let mut source = e.source();
        while let Some(cause) = source {
            lines.push(format!("  caused by: {cause}"));
            source = cause.source();
        }
    }

    let mut out = RenderedOutput::new();
    out.insert(TEXT_PLAIN, Payload::Text(lines.join("\n")));
    out.metadata_mut(TEXT_PLAIN)
        .insert("error".to_string(), serde_json::Value::Bool(true));
    out
}
