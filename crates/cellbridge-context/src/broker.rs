//! Context binding broker: per-unit lifecycle.
//!
//! Each unit moves `Unbound -> Bound -> Retired`, and `Retired` is
//! terminal. Binding writes the context into the interpreter's binding
//! table under the reserved name and hands the same handle back to the
//! host for direct injection. Retiring removes the binding and cuts the
//! context off so later calls fail with `ContextDetached`: per-unit
//! contexts are detached, the session context is suspended until the next
//! bind.

use crate::bindings::BindingTable;
use crate::config::{BridgeConfig, ContextScope};
use crate::context::{CellFunctions, ExecutionContext};
use crate::error::BridgeError;
use crate::sink::OutputSink;
use crate::unit::UnitId;
use cellbridge_convert::{StructuredConverter, TextFormat};
use cellbridge_render::{RenderRegistry, SharedRenderRegistry};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPhase {
    Unbound,
    Bound,
    Retired,
}

pub struct ContextBindingBroker {
    scope: ContextScope,
    reserved_name: String,
    default_format: TextFormat,
    renderers: SharedRenderRegistry,
    converter: Arc<StructuredConverter>,
    sink: Arc<dyn OutputSink>,
    bound: HashMap<UnitId, Arc<ExecutionContext>>,
    /// Retirement is terminal, so every retired id is kept. Nothing else
    /// about a retired unit is retained.
    retired: HashSet<UnitId>,
    session: Option<Arc<ExecutionContext>>,
}

impl ContextBindingBroker {
    /// Broker with its own converter and the built-in renderers.
    pub fn new(config: &BridgeConfig, sink: Arc<dyn OutputSink>) -> Self {
        let converter = Arc::new(StructuredConverter::with_max_depth(config.max_depth));
        let renderers = RenderRegistry::with_defaults(converter.clone()).shared();
        Self::with_registries(config, sink, renderers, converter)
    }

    /// Broker over registries shared with other sessions.
    pub fn with_registries(
        config: &BridgeConfig,
        sink: Arc<dyn OutputSink>,
        renderers: SharedRenderRegistry,
        converter: Arc<StructuredConverter>,
    ) -> Self {
        Self {
            scope: config.scope,
            reserved_name: config.reserved_name.clone(),
            default_format: config.default_text_format,
            renderers,
            converter,
            sink,
            bound: HashMap::new(),
            retired: HashSet::new(),
            session: None,
        }
    }

    pub fn scope(&self) -> ContextScope {
        self.scope
    }

    pub fn reserved_name(&self) -> &str {
        &self.reserved_name
    }

    pub fn default_format(&self) -> TextFormat {
        self.default_format
    }

    pub fn renderers(&self) -> &SharedRenderRegistry {
        &self.renderers
    }

    pub fn converter(&self) -> &Arc<StructuredConverter> {
        &self.converter
    }

    /// Bind `unit`: create (or, in session scope, reuse) its context and
    /// store it in `bindings` under the reserved name.
    pub fn bind(
        &mut self,
        unit: UnitId,
        bindings: &mut dyn BindingTable,
    ) -> Result<Arc<ExecutionContext>, BridgeError> {
        match self.state(&unit) {
            UnitPhase::Bound => return Err(BridgeError::AlreadyBound { unit }),
            UnitPhase::Retired => return Err(BridgeError::UnitRetired { unit }),
            UnitPhase::Unbound => {}
        }

        let context = match self.scope {
            ContextScope::PerUnit => Arc::new(self.new_context(unit.clone())),
            ContextScope::Session => match self.session.clone() {
                Some(shared) => {
                    shared.resume(unit.clone());
                    shared
                }
                None => {
                    let shared = Arc::new(self.new_context(unit.clone()));
                    self.session = Some(shared.clone());
                    shared
                }
            },
        };

        if bindings
            .insert(&self.reserved_name, context.clone())
            .is_some()
        {
            debug!(unit = %unit, name = %self.reserved_name, "replaced existing binding");
        }
        info!(unit = %unit, scope = ?self.scope, "unit bound");
        self.bound.insert(unit, context.clone());
        Ok(context)
    }

    /// Retire `unit`. Retiring twice is a no-op so cancellation can race
    /// normal completion.
    pub fn retire(
        &mut self,
        unit: &UnitId,
        bindings: &mut dyn BindingTable,
    ) -> Result<(), BridgeError> {
        let Some(context) = self.bound.remove(unit) else {
            if self.retired.contains(unit) {
                debug!(unit = %unit, "unit already retired");
                return Ok(());
            }
            return Err(BridgeError::NotBound { unit: unit.clone() });
        };

        if owns_binding(bindings.get(&self.reserved_name), &context, unit) {
            bindings.remove(&self.reserved_name);
        }
        match self.scope {
            ContextScope::PerUnit => context.detach(),
            // A later unit may already have taken the session context over.
            ContextScope::Session if &context.unit() == unit => context.suspend(),
            ContextScope::Session => {}
        }
        self.retired.insert(unit.clone());
        info!(unit = %unit, "unit retired");
        Ok(())
    }

    pub fn state(&self, unit: &UnitId) -> UnitPhase {
        if self.bound.contains_key(unit) {
            UnitPhase::Bound
        } else if self.retired.contains(unit) {
            UnitPhase::Retired
        } else {
            UnitPhase::Unbound
        }
    }

    /// Context of a bound unit.
    pub fn context(&self, unit: &UnitId) -> Option<Arc<ExecutionContext>> {
        self.bound.get(unit).cloned()
    }

    /// Units currently bound, sorted.
    pub fn bound_units(&self) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self.bound.keys().cloned().collect();
        units.sort();
        units
    }

    /// Retire every bound unit and detach the session context.
    pub fn close(&mut self, bindings: &mut dyn BindingTable) {
        for unit in self.bound_units() {
            // Only bound units are listed, so retiring cannot fail.
            let _ = self.retire(&unit, bindings);
        }
        if let Some(shared) = self.session.take() {
            shared.detach();
        }
        info!(retired = self.retired.len(), "broker closed");
    }

    fn new_context(&self, unit: UnitId) -> ExecutionContext {
        ExecutionContext::new(
            unit,
            self.sink.clone(),
            self.renderers.clone(),
            self.converter.clone(),
        )
        .with_default_format(self.default_format)
    }
}

/// Whether the current binding is the one `unit` installed. A later unit
/// may have replaced it, or a session context may have moved on.
fn owns_binding(
    bound: Option<Arc<dyn CellFunctions>>,
    context: &Arc<ExecutionContext>,
    unit: &UnitId,
) -> bool {
    match bound {
        Some(bound) => {
            std::ptr::eq(
                Arc::as_ptr(&bound) as *const (),
                Arc::as_ptr(context) as *const (),
            ) && &context.unit() == unit
        }
        None => false,
    }
}

impl std::fmt::Debug for ContextBindingBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBindingBroker")
            .field("scope", &self.scope)
            .field("reserved_name", &self.reserved_name)
            .field("bound", &self.bound_units())
            .finish()
    }
}
