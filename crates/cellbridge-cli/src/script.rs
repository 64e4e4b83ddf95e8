//! Cell scripts: the cells to run and the calls each one makes.
//!
//! ```yaml
//! cells:
//!   - id: intro
//!     calls:
//!       - { op: print, value: 42 }
//!       - op: asText
//!         value: { a: 1, b: [true, null] }
//!         format: compact
//!   - calls:
//!       - { op: display, value: hello }
//! ```
//!
//! Cells without an `id` are numbered by position, starting at 1, or get
//! a random UUID under [`UnitNaming::Generated`].

use cellbridge_context::{invoke, BindingTable, BridgeError, ContextBindingBroker, UnitId};
use cellbridge_core::{ConversionError, Value};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("SCRIPT/READ: cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SCRIPT/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellScript {
    #[serde(default)]
    pub cells: Vec<CellSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub calls: Vec<CallSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub op: String,
    #[serde(default)]
    pub value: serde_json::Value,
    /// Only meaningful for `asText`.
    #[serde(default)]
    pub format: Option<String>,
}

impl CallSpec {
    fn args(&self) -> Vec<Value> {
        let mut args = vec![Value::from(self.value.clone())];
        if let Some(format) = &self.format {
            args.push(Value::from(format.as_str()));
        }
        args
    }
}

/// Outcome of one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallReport {
    pub unit: UnitId,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl CellScript {
    pub fn from_yaml(yaml: &str) -> Result<Self, ScriptError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}

/// How cells without an `id` are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitNaming {
    /// Execution count: `1`, `2`, ...
    #[default]
    Positional,
    Generated,
}

impl UnitNaming {
    fn unit_for(self, index: usize, cell: &CellSpec) -> UnitId {
        match (&cell.id, self) {
            (Some(id), _) => UnitId::from(id.as_str()),
            (None, UnitNaming::Positional) => UnitId::from(index as u64 + 1),
            (None, UnitNaming::Generated) => UnitId::generate(),
        }
    }
}

/// Run every cell in order with positional naming.
pub fn run_script(
    script: &CellScript,
    broker: &mut ContextBindingBroker,
    bindings: &mut dyn BindingTable,
) -> Result<Vec<CallReport>, ScriptError> {
    run_script_with(script, UnitNaming::Positional, broker, bindings)
}

/// Run every cell in order: bind, make its calls, retire.
///
/// A call failing with an error user code would see ends its cell, like
/// an uncaught exception, and is recorded in the report. Broker misuse
/// aborts the whole script.
pub fn run_script_with(
    script: &CellScript,
    naming: UnitNaming,
    broker: &mut ContextBindingBroker,
    bindings: &mut dyn BindingTable,
) -> Result<Vec<CallReport>, ScriptError> {
    let mut reports = Vec::new();
    for (index, cell) in script.cells.iter().enumerate() {
        let unit = naming.unit_for(index, cell);
        broker.bind(unit.clone(), bindings)?;
        let outcome = run_cell(&unit, cell, broker, bindings, &mut reports);
        broker.retire(&unit, bindings)?;
        outcome?;
    }
    Ok(reports)
}

fn run_cell(
    unit: &UnitId,
    cell: &CellSpec,
    broker: &ContextBindingBroker,
    bindings: &dyn BindingTable,
    reports: &mut Vec<CallReport>,
) -> Result<(), ScriptError> {
    let functions = bindings
        .get(broker.reserved_name())
        .ok_or_else(|| BridgeError::NotBound { unit: unit.clone() })?;

    for call in &cell.calls {
        debug!(unit = %unit, op = %call.op, "calling");
        match invoke(functions.as_ref(), &call.op, &call.args(), broker.default_format()) {
            Ok(value) => {
                let value = match value {
                    Value::Null => None,
                    other => Some(broker.converter().to_json(&other)?),
                };
                reports.push(CallReport {
                    unit: unit.clone(),
                    op: call.op.clone(),
                    value,
                    error: None,
                });
            }
            Err(err) if err.is_user_visible() => {
                warn!(unit = %unit, op = %call.op, error = %err, "call failed, abandoning cell");
                reports.push(CallReport {
                    unit: unit.clone(),
                    op: call.op.clone(),
                    value: None,
                    error: Some(err.to_string()),
                });
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
