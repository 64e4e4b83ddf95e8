//! Execution context: the object user code talks to.
//!
//! Bound into the interpreter for the lifetime of a unit (or a session, see
//! [`crate::ContextScope`]). `display` and `print` write to the sink and
//! absorb rendering failures; `as_structured` and `as_text` are pure and
//! surface conversion failures. Every operation fails with
//! [`BridgeError::ContextDetached`] once the sink is gone.

use crate::error::BridgeError;
use crate::sink::{Emission, EmissionKind, OutputSink, SinkError};
use crate::unit::UnitId;
use cellbridge_convert::{StructuredConverter, TextFormat};
use cellbridge_core::Value;
use cellbridge_render::{RenderedOutput, SharedRenderRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Functions exposed to user code.
pub trait CellFunctions: Send + Sync {
    /// Render `value` and emit the bundle.
    fn display(&self, value: &Value) -> Result<(), BridgeError>;

    /// Emit only the plain-text form of `value`.
    fn print(&self, value: &Value) -> Result<(), BridgeError>;

    /// Structured form of `value` as a JSON tree.
    fn as_structured(&self, value: &Value) -> Result<serde_json::Value, BridgeError>;

    /// Serialized form of `value`.
    fn as_text(&self, value: &Value, format: TextFormat) -> Result<String, BridgeError>;

    fn as_json(&self, value: &Value) -> Result<serde_json::Value, BridgeError> {
        self.as_structured(value)
    }

    fn as_yaml(&self, value: &Value) -> Result<String, BridgeError> {
        self.as_text(value, TextFormat::Indented)
    }
}

pub struct ExecutionContext {
    unit: RwLock<UnitId>,
    sink: RwLock<Option<Arc<dyn OutputSink>>>,
    /// Set between units of a session; cleared on the next bind.
    suspended: AtomicBool,
    renderers: SharedRenderRegistry,
    converter: Arc<StructuredConverter>,
    default_format: TextFormat,
}

impl ExecutionContext {
    pub fn new(
        unit: UnitId,
        sink: Arc<dyn OutputSink>,
        renderers: SharedRenderRegistry,
        converter: Arc<StructuredConverter>,
    ) -> Self {
        Self {
            unit: RwLock::new(unit),
            sink: RwLock::new(Some(sink)),
            suspended: AtomicBool::new(false),
            renderers,
            converter,
            default_format: TextFormat::default(),
        }
    }

    pub fn with_default_format(mut self, format: TextFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Unit emissions are attributed to.
    pub fn unit(&self) -> UnitId {
        self.unit.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_unit(&self, unit: UnitId) {
        *self.unit.write().unwrap_or_else(|e| e.into_inner()) = unit;
    }

    pub fn default_format(&self) -> TextFormat {
        self.default_format
    }

    pub fn is_attached(&self) -> bool {
        !self.is_suspended()
            && self
                .sink
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Reject operations until [`resume`](Self::resume), keeping the sink.
    pub(crate) fn suspend(&self) {
        if !self.suspended.swap(true, Ordering::AcqRel) {
            debug!(unit = %self.unit(), "execution context suspended");
        }
    }

    /// Re-attribute to `unit` and accept operations again.
    pub(crate) fn resume(&self, unit: UnitId) {
        self.set_unit(unit);
        self.suspended.store(false, Ordering::Release);
    }

    /// Release the sink. Later operations fail with `ContextDetached`.
    pub fn detach(&self) {
        let released = self
            .sink
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if released.is_some() {
            info!(unit = %self.unit(), "execution context detached");
        }
    }

    /// `as_text` in the configured default format.
    pub fn as_default_text(&self, value: &Value) -> Result<String, BridgeError> {
        self.as_text(value, self.default_format)
    }

    /// Render `value` plus alternates and emit them as one bundle.
    pub fn display_with_alternates(
        &self,
        value: &Value,
        alternates: &[Value],
    ) -> Result<(), BridgeError> {
        let sink = self.attached_sink()?;
        let output = self
            .renderers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .render_with_alternates(value, alternates);
        self.emit(&sink, EmissionKind::Display, output)
    }

    fn attached_sink(&self) -> Result<Arc<dyn OutputSink>, BridgeError> {
        if self.is_suspended() {
            return Err(self.detached());
        }
        self.sink
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| self.detached())
    }

    fn ensure_attached(&self) -> Result<(), BridgeError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(self.detached())
        }
    }

    fn detached(&self) -> BridgeError {
        BridgeError::ContextDetached { unit: self.unit() }
    }

    fn emit(
        &self,
        sink: &Arc<dyn OutputSink>,
        kind: EmissionKind,
        output: RenderedOutput,
    ) -> Result<(), BridgeError> {
        let unit = self.unit();
        debug!(unit = %unit, kind = kind.message_type(), mimes = output.len(), "emitting");
        match sink.emit(Emission::new(unit, kind, output)) {
            Ok(()) => Ok(()),
            Err(SinkError::Closed) => {
                self.detach();
                Err(self.detached())
            }
        }
    }
}

impl CellFunctions for ExecutionContext {
    fn display(&self, value: &Value) -> Result<(), BridgeError> {
        self.display_with_alternates(value, &[])
    }

    fn print(&self, value: &Value) -> Result<(), BridgeError> {
        let sink = self.attached_sink()?;
        let rendered = self
            .renderers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .render(value);
        let text = match rendered.plain_text() {
            Some(text) if !rendered.is_error() => text.to_string(),
            _ => value.to_string(),
        };
        self.emit(&sink, EmissionKind::Print, RenderedOutput::text(text))
    }

    fn as_structured(&self, value: &Value) -> Result<serde_json::Value, BridgeError> {
        self.ensure_attached()?;
        Ok(self.converter.to_json(value)?)
    }

    fn as_text(&self, value: &Value, format: TextFormat) -> Result<String, BridgeError> {
        self.ensure_attached()?;
        Ok(self.converter.to_text(value, format)?)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("unit", &self.unit())
            .field("attached", &self.is_attached())
            .field("default_format", &self.default_format)
            .finish()
    }
}
