//! Execution-unit identity.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one execution unit (a notebook cell run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        UnitId(id.into())
    }

    /// Fresh random id.
    pub fn generate() -> Self {
        UnitId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        UnitId::new(id)
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        UnitId(id)
    }
}

impl From<u64> for UnitId {
    fn from(execution_count: u64) -> Self {
        UnitId(execution_count.to_string())
    }
}
