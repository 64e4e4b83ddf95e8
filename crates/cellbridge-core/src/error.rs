//! Conversion error model
use crate::types::TypeKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("CONVERT/NUMBER: {0} has no structured-number encoding")]
    UnsupportedNumber(f64),

    #[error("CONVERT/DEPTH: nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("CONVERT/SERIALIZE: {0}")]
    Serialize(String),

    #[error("CONVERT/CUSTOM: {type_key}: {message}")]
    Custom { type_key: TypeKey, message: String },
}
