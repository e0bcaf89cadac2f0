//! # Stealth NFT Store
//!
//! Storage abstraction for the stealth NFT ledger. Provides a trait-based
//! interface over the three pieces of shared state with SQLite and in-memory
//! implementations:
//!
//! - the key registry (account -> public key)
//! - token ownership, per-token approvals and operator approvals
//! - the append-only transfer record log
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stealth_nft_core::{Address, TokenId};
//! use stealth_nft_store::{SqliteStore, Store};
//!
//! async fn example() -> stealth_nft_store::Result<()> {
//!     let store = SqliteStore::open("ledger.db")?;
//!
//!     let owner = Address::from_bytes([1; 20]);
//!     store.insert_token(TokenId::new(10), &owner).await?;
//!     assert_eq!(store.get_owner(TokenId::new(10)).await?, Some(owner));
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic transfers**: [`Store::commit_transfer`] checks the owner,
//!   moves the token, clears its approval and appends the record in one
//!   step. Either all of it happens or none of it does.
//! - **Gap-free log**: record sequence numbers start at 1 and increase by
//!   one per appended record.
//! - **No validation**: the store persists what it is given. Curve checks
//!   and authorization happen in the ledger above it.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
