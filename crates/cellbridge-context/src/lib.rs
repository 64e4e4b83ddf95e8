//! # cellbridge-context
//!
//! Per-unit execution contexts for code running in an embedded
//! interpreter. A [`ContextBindingBroker`] binds one
//! [`ExecutionContext`] per unit into the interpreter's binding table
//! and retires it when the unit completes or is cancelled. User code
//! reaches the host through the [`CellFunctions`] it exposes.
//!
//! ```
//! use cellbridge_context::{
//!     BridgeConfig, CellFunctions, ContextBindingBroker, MemorySink, SimpleBindings, UnitId,
//! };
//! use cellbridge_core::Value;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let mut broker = ContextBindingBroker::new(&BridgeConfig::default(), sink.clone());
//! let mut bindings = SimpleBindings::new();
//!
//! let ctx = broker.bind(UnitId::from(1u64), &mut bindings).unwrap();
//! ctx.print(&Value::Int(42)).unwrap();
//! broker.retire(&UnitId::from(1u64), &mut bindings).unwrap();
//!
//! assert_eq!(sink.texts(), vec!["42"]);
//! assert!(ctx.print(&Value::Int(43)).is_err());
//! ```

pub mod bindings;
pub mod broker;
pub mod config;
pub mod context;
pub mod error;
pub mod functions;
pub mod sink;
pub mod unit;

pub use bindings::{BindingTable, SimpleBindings};
pub use broker::{ContextBindingBroker, UnitPhase};
pub use config::{BridgeConfig, ConfigError, ContextScope, CONFIG_ENV, RESERVED_NAME};
pub use context::{CellFunctions, ExecutionContext};
pub use error::BridgeError;
pub use functions::{cell_functions, invoke, CellFunction};
pub use sink::{ChannelSink, Emission, EmissionKind, MemorySink, OutputSink, SinkError};
pub use unit::UnitId;
