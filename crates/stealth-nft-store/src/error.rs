//! Error types for the store module.

use stealth_nft_core::{Address, TokenId};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A transfer named an owner that does not hold the token. `actual` is
    /// `None` when the token was never minted.
    #[error("token {token_id} is not owned by {expected}")]
    OwnerMismatch {
        token_id: TokenId,
        expected: Address,
        actual: Option<Address>,
    },

    /// Token id already minted.
    #[error("token {0} already exists")]
    TokenExists(TokenId),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
