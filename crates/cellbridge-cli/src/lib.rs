//! # cellbridge-cli
//!
//! Demo host for the bridge: loads a cell script, runs each cell through
//! a [`cellbridge_context::ContextBindingBroker`] and streams what the
//! cells emit as JSON lines.

pub mod cli;
pub mod output;
pub mod script;

pub use cli::Cli;
pub use output::OutputLine;
pub use script::{
    run_script, run_script_with, CallReport, CallSpec, CellScript, CellSpec, ScriptError,
    UnitNaming,
};
