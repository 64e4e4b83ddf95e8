//! Renderer contract.

use crate::bundle::RenderedOutput;
use cellbridge_core::{ConversionError, TypeKey, Value};
use thiserror::Error;

/// Renderer failures. Always absorbed by the registry.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("RENDER/TYPE: expected {expected}, got {got}")]
    UnexpectedType { expected: String, got: TypeKey },

    #[error("RENDER/CONVERT: {0}")]
    Conversion(#[from] ConversionError),

    #[error("RENDER/FAILED: {0}")]
    Failed(String),
}

impl RenderError {
    pub fn unexpected(expected: impl Into<String>, value: &Value) -> Self {
        RenderError::UnexpectedType {
            expected: expected.into(),
            got: value.type_info().key().clone(),
        }
    }
}

/// Writes representations of a value into a bundle.
///
/// Renderers add mime types they do not find in the bundle and leave the
/// rest alone. Writing nothing declines the value; the registry then falls
/// back to its default renderer.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &str;

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError>;
}

/// Closure-backed renderer.
pub struct FnRenderer<F> {
    name: String,
    f: F,
}

impl<F> FnRenderer<F>
where
    F: Fn(&mut RenderedOutput, &Value) -> Result<(), RenderError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&mut RenderedOutput, &Value) -> Result<(), RenderError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render_to(&self, bundle: &mut RenderedOutput, value: &Value) -> Result<(), RenderError> {
        (self.f)(bundle, value)
    }
}
