//! Bridge configuration, loaded from YAML.
//!
//! ```yaml
//! scope: per_unit          # or: session
//! reserved_name: "$$"
//! max_depth: 128
//! default_text_format: indented   # or: compact
//! log_level: info
//! ```
use cellbridge_convert::{TextFormat, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file when no path is given.
pub const CONFIG_ENV: &str = "CELLBRIDGE_CONFIG";

pub const RESERVED_NAME: &str = "$$";

/// Lifetime of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScope {
    /// Fresh context per unit, detached when the unit retires.
    #[default]
    PerUnit,
    /// One context for the whole session, re-attributed on every bind.
    Session,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONFIG/READ: cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("CONFIG/INVALID: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub scope: ContextScope,
    /// Binding-table key the context is stored under.
    pub reserved_name: String,
    /// Nesting limit for structured conversion.
    pub max_depth: usize,
    /// Format `asText` uses when the caller names none.
    pub default_text_format: TextFormat,
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scope: ContextScope::default(),
            reserved_name: RESERVED_NAME.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            default_text_format: TextFormat::default(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Explicit path, then `CELLBRIDGE_CONFIG`, then defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve_from(path, from_env.as_deref())
    }

    fn resolve_from(path: Option<&Path>, from_env: Option<&Path>) -> Result<Self, ConfigError> {
        match path.or(from_env) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserved_name.trim().is_empty() {
            return Err(ConfigError::Invalid("reserved_name must not be empty".into()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
