//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use stealth_nft::{Ledger, LedgerConfig, Result};
use stealth_nft_core::{
    Address, EphemeralSecret, PublicKey, RecordEntry, SecretKey, StealthPayment, TokenId,
};
use stealth_nft_store::MemoryStore;

/// One participant: a secp256k1 key and the address it controls.
#[derive(Debug, Clone)]
pub struct Party {
    pub secret: SecretKey,
}

impl Party {
    /// A party with a random key.
    pub fn new() -> Self {
        Self {
            secret: SecretKey::generate(),
        }
    }

    /// A party with a fixed key. Panics on an invalid hex scalar.
    pub fn from_hex(secret: &str) -> Self {
        Self {
            secret: SecretKey::from_hex(secret).expect("valid test scalar"),
        }
    }

    pub fn address(&self) -> Address {
        self.secret.address()
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }
}

impl Default for Party {
    fn default() -> Self {
        Self::new()
    }
}

/// A memory-backed ledger with a sender and a receiver.
pub struct TestFixture {
    pub ledger: Ledger<MemoryStore>,
    pub sender: Party,
    pub receiver: Party,
}

impl TestFixture {
    /// Random parties, default config.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::new(MemoryStore::new(), config),
            sender: Party::new(),
            receiver: Party::new(),
        }
    }

    /// Register the receiver's key under its own address.
    pub async fn register_receiver(&self) -> Result<()> {
        self.ledger
            .register(&self.receiver.address(), &self.receiver.public_key())
            .await
    }

    /// Mint `token_id` to the sender.
    pub async fn mint_to_sender(&self, token_id: TokenId) -> Result<()> {
        self.ledger.mint(&self.sender.address(), token_id).await
    }

    /// Sender derives for the registered receiver and transfers.
    pub async fn stealth_send(
        &self,
        token_id: TokenId,
        secret: &EphemeralSecret,
    ) -> Result<(StealthPayment, RecordEntry)> {
        self.ledger
            .send_stealth(
                &self.sender.address(),
                &self.receiver.address(),
                token_id,
                secret,
            )
            .await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` parties with keys 1, 2, ... `count`.
pub fn parties(count: usize) -> Vec<Party> {
    (1..=count)
        .map(|i| Party::from_hex(&format!("{:x}", i)))
        .collect()
}
