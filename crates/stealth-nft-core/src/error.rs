//! Error types for the stealth core.

use thiserror::Error;

/// Errors raised by curve arithmetic, key handling and stealth derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A scalar or point is outside its valid range (zero scalar, scalar
    /// not below the group order, coordinate not below the field prime,
    /// point off the curve, or the identity).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A public key offered for registration does not lie on the curve.
    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl CoreError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
