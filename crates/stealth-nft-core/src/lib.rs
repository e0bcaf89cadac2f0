//! # Stealth NFT Core
//!
//! Pure primitives for stealth token transfers: secp256k1 arithmetic, key
//! material, and the dual-key stealth address derivation.
//!
//! This crate contains no I/O, no storage, no locking. Every function is a
//! computation over its arguments, so derivations can run concurrently from
//! any number of callers.
//!
//! ## Key Types
//!
//! - [`PublicKey`] - Affine coordinates of a registered key
//! - [`SecretKey`] - A scalar in `[1, n-1]`
//! - [`EphemeralSecret`] - The sender's one-time scalar `r`
//! - [`StealthPayment`] - Stealth address plus the ephemeral point to publish
//! - [`TransferRecord`] - `(stealthAddress, R.x, R.y)` as emitted on transfer
//!
//! ## Protocol
//!
//! See the [`stealth`] module for the sender and receiver derivations.

pub mod curve;
pub mod error;
pub mod keys;
pub mod record;
pub mod stealth;
pub mod types;
pub mod validation;

pub use curve::{CurvePoint, STEALTH_DOMAIN};
pub use error::{CoreError, Result};
pub use keys::{EphemeralPoint, EphemeralSecret, PublicKey, SecretKey};
pub use record::{RecordEntry, TransferRecord};
pub use stealth::{
    check_record, derive_stealth_address, derive_stealth_public_key, recover_stealth_private_key,
    scan, verify_key_pair, ScanMatch, StealthPayment,
};
pub use types::{Address, TokenId};
