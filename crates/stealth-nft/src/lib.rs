//! # Stealth NFT
//!
//! A token ledger with stealth transfers: a sender moves a token to a
//! one-time address that only the intended receiver can control, and no
//! observer can link that address to the receiver from ledger data alone.
//!
//! ## Overview
//!
//! - **Key Registry**: receivers publish one secp256k1 public key each
//! - **Stealth derivation**: senders derive a fresh address from the
//!   receiver's key and a one-time secret
//! - **Stealth transfer**: an authorized transfer to that address, plus a
//!   public record `(stealthAddress, R.x, R.y)`
//! - **Recovery**: receivers scan the records and rebuild the private key of
//!   each stealth address that belongs to them
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stealth_nft::{EphemeralSecret, Ledger, LedgerConfig, SecretKey, TokenId};
//! use stealth_nft::store::MemoryStore;
//!
//! async fn example() -> stealth_nft::Result<()> {
//!     let ledger = Ledger::new(MemoryStore::new(), LedgerConfig::default());
//!
//!     let sender = SecretKey::generate().address();
//!     let receiver = SecretKey::generate();
//!     ledger.register(&receiver.address(), &receiver.public_key()).await?;
//!     ledger.mint(&sender, TokenId::new(10)).await?;
//!
//!     // Sender side.
//!     let payment = ledger
//!         .derive_stealth_address_for(&receiver.address(), &EphemeralSecret::random())
//!         .await?;
//!     ledger
//!         .stealth_transfer(
//!             &sender,
//!             &payment.stealth_address,
//!             TokenId::new(10),
//!             &payment.ephemeral,
//!         )
//!         .await?;
//!
//!     // Receiver side.
//!     for found in ledger.scan(&receiver, 0).await? {
//!         let owner = found.stealth_key.address();
//!         ledger
//!             .transfer_from(&owner, &owner, &receiver.address(), TokenId::new(10))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `stealth_nft::core` - Curve primitive, keys, stealth derivation
//! - `stealth_nft::store` - Storage abstraction and SQLite

pub mod error;
pub mod ledger;
pub mod ownership;
pub mod protocol;
pub mod registry;

pub use stealth_nft_core as core;
pub use stealth_nft_store as store;

pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig};
pub use ownership::OwnershipLedger;
pub use protocol::TransferProtocol;
pub use registry::KeyRegistry;

pub use stealth_nft_core::{
    Address, CoreError, EphemeralPoint, EphemeralSecret, PublicKey, RecordEntry, ScanMatch,
    SecretKey, StealthPayment, TokenId, TransferRecord,
};
