//! Store trait: the abstract interface for ledger state.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use stealth_nft_core::{Address, PublicKey, RecordEntry, TokenId, TransferRecord};

use crate::error::Result;

/// The Store trait: async interface for registry, ownership and record
/// persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// Each method is atomic on its own. Sequencing several calls into one
/// logical operation (check then write) is the caller's job; the ledger
/// holds a write lock for that.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Key Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the public key registered for an account.
    async fn get_public_key(&self, account: &Address) -> Result<Option<PublicKey>>;

    /// Store or overwrite the public key for an account.
    async fn put_public_key(&self, account: &Address, key: &PublicKey) -> Result<()>;

    /// All accounts with a registered key, ordered by address.
    async fn list_registered(&self) -> Result<Vec<Address>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a token owned by `owner`.
    ///
    /// Fails with `TokenExists` if the id is taken.
    async fn insert_token(&self, token_id: TokenId, owner: &Address) -> Result<()>;

    /// Current owner, or `None` if never minted.
    async fn get_owner(&self, token_id: TokenId) -> Result<Option<Address>>;

    /// Number of tokens held by `owner`.
    async fn balance_of(&self, owner: &Address) -> Result<u64>;

    /// Ids of the tokens held by `owner`, ascending.
    async fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>>;

    /// The single address approved for a token, if any.
    async fn get_approval(&self, token_id: TokenId) -> Result<Option<Address>>;

    /// Set or clear (`None`) the approval for a token.
    async fn set_approval(&self, token_id: TokenId, approved: Option<&Address>) -> Result<()>;

    /// Whether `operator` may manage all of `owner`'s tokens.
    async fn is_operator(&self, owner: &Address, operator: &Address) -> Result<bool>;

    /// Grant or revoke operator status.
    async fn set_operator(&self, owner: &Address, operator: &Address, approved: bool)
        -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────

    /// Move a token from `from` to `to` and optionally append a record.
    ///
    /// In one atomic step:
    /// 1. Check `from` is the current owner (`OwnerMismatch` otherwise).
    /// 2. Set the owner to `to` and clear the token's approval.
    /// 3. If `record` is given, append it to the log.
    ///
    /// # Returns
    /// The sequence number of the appended record, or `None` when no record
    /// was given. On error nothing is changed.
    async fn commit_transfer(
        &self,
        token_id: TokenId,
        from: &Address,
        to: &Address,
        record: Option<&TransferRecord>,
        now: i64,
    ) -> Result<Option<u64>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Record Log
    // ─────────────────────────────────────────────────────────────────────────

    /// Records with `seq > after_seq`, ordered by seq, at most `limit`.
    async fn records_since(&self, after_seq: u64, limit: usize) -> Result<Vec<RecordEntry>>;

    /// Number of records in the log (equal to the highest seq).
    async fn record_count(&self) -> Result<u64>;
}
