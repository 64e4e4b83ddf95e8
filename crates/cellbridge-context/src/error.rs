//! Bridge error model
use crate::unit::UnitId;
use cellbridge_core::ConversionError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The context's sink is gone: the unit was retired or the host closed the channel.
    #[error("CONTEXT/DETACHED: execution context for unit {unit} is detached")]
    ContextDetached { unit: UnitId },

    #[error("BROKER/ALREADY_BOUND: unit {unit} is already bound")]
    AlreadyBound { unit: UnitId },

    #[error("BROKER/RETIRED: unit {unit} was retired and cannot be bound again")]
    UnitRetired { unit: UnitId },

    #[error("BROKER/NOT_BOUND: unit {unit} was never bound")]
    NotBound { unit: UnitId },

    #[error("CALL/UNKNOWN: no cell function named `{0}`")]
    UnknownFunction(String),

    #[error("CALL/ARGS: {function}: {message}")]
    BadArguments { function: String, message: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl BridgeError {
    /// True for the errors user code may see; broker misuse is host-only.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            BridgeError::ContextDetached { .. }
                | BridgeError::Conversion(_)
                | BridgeError::UnknownFunction(_)
                | BridgeError::BadArguments { .. }
        )
    }
}
