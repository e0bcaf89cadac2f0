//! # Stealth NFT Testkit
//!
//! Testing utilities for the stealth NFT ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed keys and secrets with the addresses and
//!   stealth keys they must produce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A ready ledger with a sender and a receiver
//!
//! ## Golden Vectors
//!
//! ```rust
//! use stealth_nft_testkit::vectors::{all_vectors, check_vector};
//!
//! for vector in all_vectors() {
//!     check_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use stealth_nft_testkit::generators::{payment_from_params, StealthParams};
//!
//! proptest! {
//!     #[test]
//!     fn derivation_is_deterministic(params: StealthParams) {
//!         prop_assert_eq!(payment_from_params(&params), payment_from_params(&params));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use stealth_nft_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! assert_ne!(fixture.sender.address(), fixture.receiver.address());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{parties, Party, TestFixture};
pub use generators::{payment_from_params, StealthParams};
pub use vectors::{all_vectors, check_vector, verify_all_vectors, GoldenVector};
