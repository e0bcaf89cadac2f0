//! Key registry: one public key per account.

use std::sync::Arc;

use stealth_nft_core::{Address, PublicKey};
use stealth_nft_store::Store;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};

/// Validating front for the registry mapping in the store.
///
/// Only checks the key. That `account` is really the caller is up to the
/// layer that authenticates callers.
pub struct KeyRegistry<S: Store> {
    store: Arc<S>,
}

impl<S: Store> KeyRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Store or overwrite `account`'s key.
    ///
    /// Fails with `InvalidPublicKey` if the point is not on the curve; the
    /// previous entry, if any, is left as it was.
    pub async fn register(&self, account: &Address, key: &PublicKey) -> Result<()> {
        if let Err(e) = key.validate() {
            warn!(account = %account, "rejected registration: key not on curve");
            return Err(e.into());
        }

        self.store.put_public_key(account, key).await?;
        info!(account = %account, "registered public key");
        Ok(())
    }

    /// The key registered for `account`, or `NotRegistered`.
    pub async fn public_key_of(&self, account: &Address) -> Result<PublicKey> {
        let key = self.store.get_public_key(account).await?;
        debug!(account = %account, found = key.is_some(), "public key lookup");
        key.ok_or(LedgerError::NotRegistered(*account))
    }

    pub async fn is_registered(&self, account: &Address) -> Result<bool> {
        Ok(self.store.get_public_key(account).await?.is_some())
    }

    /// Accounts with a registered key, ordered by address.
    pub async fn registered_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.store.list_registered().await?)
    }
}

impl<S: Store> Clone for KeyRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_nft_core::{CoreError, SecretKey};
    use stealth_nft_store::MemoryStore;

    fn registry() -> KeyRegistry<MemoryStore> {
        KeyRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry();
        let key = SecretKey::generate();
        let account = key.address();

        registry.register(&account, &key.public_key()).await.unwrap();
        assert_eq!(registry.public_key_of(&account).await.unwrap(), key.public_key());
        assert!(registry.is_registered(&account).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let registry = registry();
        let account = Address::from_bytes([9; 20]);
        let err = registry.public_key_of(&account).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotRegistered(a) if a == account));
    }

    #[tokio::test]
    async fn test_off_curve_rejected_and_prior_entry_kept() {
        let registry = registry();
        let account = Address::from_bytes([1; 20]);
        let good = SecretKey::generate().public_key();
        registry.register(&account, &good).await.unwrap();

        let mut bad = good;
        bad.x[5] ^= 0x10;
        let err = registry.register(&account, &bad).await.unwrap_err();

        assert!(matches!(err, LedgerError::Core(CoreError::InvalidPublicKey)));
        assert_eq!(registry.public_key_of(&account).await.unwrap(), good);
    }

    #[tokio::test]
    async fn test_register_isolated_per_account() {
        let registry = registry();
        let a = Address::from_bytes([1; 20]);
        let b = Address::from_bytes([2; 20]);
        let key_a = SecretKey::generate().public_key();
        let key_b = SecretKey::generate().public_key();

        registry.register(&a, &key_a).await.unwrap();
        registry.register(&b, &key_b).await.unwrap();
        registry
            .register(&a, &SecretKey::generate().public_key())
            .await
            .unwrap();

        assert_eq!(registry.public_key_of(&b).await.unwrap(), key_b);
        assert_eq!(registry.registered_accounts().await.unwrap(), vec![a, b]);
    }
}
