//! Error types for the ledger.

use stealth_nft_core::{Address, CoreError, TokenId};
use stealth_nft_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid scalar or point (`InvalidInput`), or a registration key off
    /// the curve (`InvalidPublicKey`).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No key registered for the account.
    #[error("account {0} has no registered public key")]
    NotRegistered(Address),

    /// Caller is neither owner, approved, nor operator, or named the wrong
    /// current owner.
    #[error("{caller} is not authorized to transfer token {token_id}")]
    Unauthorized { caller: Address, token_id: TokenId },

    /// Token was never minted.
    #[error("token {0} does not exist")]
    NonexistentToken(TokenId),

    /// Token id already minted.
    #[error("token {0} already exists")]
    TokenExists(TokenId),

    /// Tokens cannot be sent to or minted for the zero address, and it
    /// cannot be made an operator.
    #[error("invalid recipient: zero address")]
    InvalidRecipient,
}

impl LedgerError {
    /// Whether this is a malformed scalar or point.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, LedgerError::Core(CoreError::InvalidInput(_)))
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
