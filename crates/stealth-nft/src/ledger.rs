//! The Ledger: unified API for stealth token transfers.
//!
//! The Ledger brings together the key registry, the ownership ledger and
//! the stealth transfer protocol over one shared store, and serializes
//! every state change.

use std::sync::Arc;

use stealth_nft_core::{
    stealth, Address, EphemeralPoint, EphemeralSecret, PublicKey, RecordEntry, ScanMatch,
    SecretKey, StealthPayment, TokenId,
};
use stealth_nft_store::Store;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::ownership::OwnershipLedger;
use crate::protocol::TransferProtocol;
use crate::registry::KeyRegistry;

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Upper bound on entries returned by one `records_since` call.
    pub max_scan_batch: usize,
    /// Reject stealth transfers whose ephemeral point is off the curve.
    /// Such a record can never be claimed.
    pub validate_ephemeral_points: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_scan_batch: 1024,
            validate_ephemeral_points: false,
        }
    }
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Registering and looking up receiver keys
/// - Minting, approving and transferring tokens
/// - Deriving stealth addresses and sending tokens to them
/// - Reading the record log and scanning it for incoming transfers
///
/// State-changing calls take an internal write lock, so no call observes
/// another half applied. Reads and derivations do not take it.
pub struct Ledger<S: Store> {
    store: Arc<S>,
    config: LedgerConfig,
    registry: KeyRegistry<S>,
    ownership: OwnershipLedger<S>,
    protocol: TransferProtocol<S>,
    write_lock: Mutex<()>,
}

impl<S: Store> Ledger<S> {
    /// Create a new ledger over `store`.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a ledger over a store handle shared with other code.
    ///
    /// Writes made through other handles are not serialized with this
    /// ledger's.
    pub fn with_shared_store(store: Arc<S>, config: LedgerConfig) -> Self {
        let ownership = OwnershipLedger::new(Arc::clone(&store));
        Self {
            registry: KeyRegistry::new(Arc::clone(&store)),
            protocol: TransferProtocol::new(ownership.clone(), config.validate_ephemeral_points),
            ownership,
            store,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Register or replace `account`'s public key.
    ///
    /// Fails with `InvalidPublicKey` if the point is not on the curve.
    pub async fn register(&self, account: &Address, key: &PublicKey) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.registry.register(account, key).await
    }

    /// Fails with `NotRegistered` on a miss.
    pub async fn public_key_of(&self, account: &Address) -> Result<PublicKey> {
        self.registry.public_key_of(account).await
    }

    pub async fn registered_accounts(&self) -> Result<Vec<Address>> {
        self.registry.registered_accounts().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn mint(&self, owner: &Address, token_id: TokenId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ownership.mint(owner, token_id).await
    }

    pub async fn owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.ownership.owner_of(token_id).await
    }

    pub async fn balance_of(&self, owner: &Address) -> Result<u64> {
        self.ownership.balance_of(owner).await
    }

    pub async fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>> {
        self.ownership.tokens_of(owner).await
    }

    pub async fn approve(
        &self,
        caller: &Address,
        approved: &Address,
        token_id: TokenId,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ownership.approve(caller, approved, token_id).await
    }

    pub async fn get_approved(&self, token_id: TokenId) -> Result<Option<Address>> {
        self.ownership.get_approved(token_id).await
    }

    pub async fn set_approval_for_all(
        &self,
        caller: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ownership
            .set_approval_for_all(caller, operator, approved)
            .await
    }

    pub async fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> Result<bool> {
        self.ownership.is_approved_for_all(owner, operator).await
    }

    /// Standard authorized transfer. Emits no record.
    pub async fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ownership.transfer_from(caller, from, to, token_id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stealth Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Derive a stealth address for a known public key. Pure.
    pub fn derive_stealth_address(
        &self,
        receiver: &PublicKey,
        secret: &EphemeralSecret,
    ) -> Result<StealthPayment> {
        Ok(stealth::derive_stealth_address(receiver, secret)?)
    }

    /// Derive a stealth address for a registered account.
    pub async fn derive_stealth_address_for(
        &self,
        receiver: &Address,
        secret: &EphemeralSecret,
    ) -> Result<StealthPayment> {
        let key = self.registry.public_key_of(receiver).await?;
        Ok(stealth::derive_stealth_address(&key, secret)?)
    }

    /// Move `token_id` to `stealth_address` and publish
    /// `(stealth_address, R.x, R.y)`. Returns the appended log entry.
    pub async fn stealth_transfer(
        &self,
        caller: &Address,
        stealth_address: &Address,
        token_id: TokenId,
        ephemeral: &EphemeralPoint,
    ) -> Result<RecordEntry> {
        let _guard = self.write_lock.lock().await;
        self.protocol
            .stealth_transfer(caller, stealth_address, token_id, ephemeral)
            .await
    }

    /// Derive for a registered receiver and transfer in one step.
    pub async fn send_stealth(
        &self,
        caller: &Address,
        receiver: &Address,
        token_id: TokenId,
        secret: &EphemeralSecret,
    ) -> Result<(StealthPayment, RecordEntry)> {
        let _guard = self.write_lock.lock().await;
        let key = self.registry.public_key_of(receiver).await?;
        let payment = stealth::derive_stealth_address(&key, secret)?;
        let entry = self
            .protocol
            .stealth_transfer(caller, &payment.stealth_address, token_id, &payment.ephemeral)
            .await?;
        Ok((payment, entry))
    }

    /// Receiver side: the private key for a published ephemeral point. Pure.
    pub fn recover_stealth_private_key(
        &self,
        receiver: &SecretKey,
        ephemeral: &EphemeralPoint,
    ) -> Result<SecretKey> {
        Ok(stealth::recover_stealth_private_key(receiver, ephemeral)?)
    }

    pub fn verify_key_pair(&self, private: &SecretKey, public: &PublicKey) -> bool {
        stealth::verify_key_pair(private, public)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Record Log
    // ─────────────────────────────────────────────────────────────────────────

    /// Records with `seq > after_seq`, oldest first, at most
    /// `max_scan_batch` of them. Page by passing the last seq seen.
    pub async fn records_since(&self, after_seq: u64) -> Result<Vec<RecordEntry>> {
        let limit = self.config.max_scan_batch.max(1);
        Ok(self.store.records_since(after_seq, limit).await?)
    }

    pub async fn record_count(&self) -> Result<u64> {
        Ok(self.store.record_count().await?)
    }

    /// Every record after `after_seq` addressed to the holder of
    /// `receiver`, with the recovered stealth keys.
    pub async fn scan(&self, receiver: &SecretKey, after_seq: u64) -> Result<Vec<ScanMatch>> {
        let mut cursor = after_seq;
        let mut found = Vec::new();

        loop {
            let page = self.records_since(cursor).await?;
            let Some(last) = page.last() else { break };
            cursor = last.seq;
            found.extend(stealth::scan(receiver, &page));
        }

        debug!(after_seq, scanned_to = cursor, matches = found.len(), "scanned record log");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use stealth_nft_store::MemoryStore;

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::new(MemoryStore::new(), LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_derive_for_unregistered_account() {
        let ledger = ledger();
        let err = ledger
            .derive_stealth_address_for(&Address::from_bytes([4; 20]), &EphemeralSecret::random())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotRegistered(_)));
    }

    #[tokio::test]
    async fn test_send_stealth_to_registered_receiver() {
        let ledger = ledger();
        let sender = SecretKey::generate().address();
        let receiver = SecretKey::generate();
        ledger
            .register(&receiver.address(), &receiver.public_key())
            .await
            .unwrap();
        ledger.mint(&sender, TokenId::new(3)).await.unwrap();

        let (payment, entry) = ledger
            .send_stealth(
                &sender,
                &receiver.address(),
                TokenId::new(3),
                &EphemeralSecret::random(),
            )
            .await
            .unwrap();

        assert_eq!(entry.record, payment.to_record());
        assert_eq!(ledger.owner_of(TokenId::new(3)).await.unwrap(), payment.stealth_address);

        let found = ledger.scan(&receiver, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stealth_address, payment.stealth_address);
    }

    #[tokio::test]
    async fn test_send_stealth_unregistered_changes_nothing() {
        let ledger = ledger();
        let sender = Address::from_bytes([1; 20]);
        ledger.mint(&sender, TokenId::new(3)).await.unwrap();

        let err = ledger
            .send_stealth(
                &sender,
                &Address::from_bytes([2; 20]),
                TokenId::new(3),
                &EphemeralSecret::random(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotRegistered(_)));
        assert_eq!(ledger.owner_of(TokenId::new(3)).await.unwrap(), sender);
        assert_eq!(ledger.record_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_records_since_respects_batch_size() {
        let ledger = Ledger::new(
            MemoryStore::new(),
            LedgerConfig {
                max_scan_batch: 2,
                ..LedgerConfig::default()
            },
        );
        let sender = Address::from_bytes([1; 20]);
        let receiver = SecretKey::generate();

        for id in 0..5 {
            ledger.mint(&sender, TokenId::new(id)).await.unwrap();
            let payment = ledger
                .derive_stealth_address(&receiver.public_key(), &EphemeralSecret::random())
                .unwrap();
            ledger
                .stealth_transfer(
                    &sender,
                    &payment.stealth_address,
                    TokenId::new(id),
                    &payment.ephemeral,
                )
                .await
                .unwrap();
        }

        assert_eq!(ledger.records_since(0).await.unwrap().len(), 2);
        assert_eq!(ledger.records_since(4).await.unwrap().len(), 1);
        assert_eq!(ledger.record_count().await.unwrap(), 5);

        // Scan pages through the whole log regardless of batch size.
        let found = ledger.scan(&receiver, 0).await.unwrap();
        assert_eq!(found.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(ledger.scan(&receiver, 3).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_stealth_transfers_get_distinct_seqs() {
        let ledger = Arc::new(ledger());
        let sender = Address::from_bytes([1; 20]);
        let receiver = SecretKey::generate();
        for id in 0..8 {
            ledger.mint(&sender, TokenId::new(id)).await.unwrap();
        }

        let mut handles = Vec::new();
        for id in 0..8 {
            let ledger = Arc::clone(&ledger);
            let key = receiver.public_key();
            handles.push(tokio::spawn(async move {
                let payment = ledger
                    .derive_stealth_address(&key, &EphemeralSecret::random())
                    .unwrap();
                ledger
                    .stealth_transfer(
                        &sender,
                        &payment.stealth_address,
                        TokenId::new(id),
                        &payment.ephemeral,
                    )
                    .await
                    .unwrap()
                    .seq
            }));
        }

        let mut seqs = Vec::new();
        for handle in handles {
            seqs.push(handle.await.unwrap());
        }
        seqs.sort();
        assert_eq!(seqs, (1..=8).collect::<Vec<u64>>());
    }

    fn key(i: u8) -> SecretKey {
        SecretKey::from_hex(&format!("{:x}", i)).unwrap()
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[derive(Debug, Clone, Copy)]
    enum Caller {
        Owner,
        Approved,
        Operator,
        Stranger,
    }

    fn caller_strategy() -> impl Strategy<Value = Caller> {
        prop_oneof![
            Just(Caller::Owner),
            Just(Caller::Approved),
            Just(Caller::Operator),
            Just(Caller::Stranger),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Registering one account never touches another account's key.
        #[test]
        fn prop_registry_isolation(
            ops in proptest::collection::vec((0u8..4, 1u8..=255), 1..12),
        ) {
            let rt = runtime();
            rt.block_on(async {
                let ledger = ledger();
                let accounts: Vec<Address> =
                    (1..=4).map(|i| Address::from_bytes([i; 20])).collect();
                let mut expected: HashMap<Address, PublicKey> = HashMap::new();

                for (account, secret) in ops {
                    let account = accounts[account as usize];
                    let public = key(secret).public_key();
                    ledger.register(&account, &public).await.unwrap();
                    expected.insert(account, public);

                    for other in &accounts {
                        match expected.get(other) {
                            Some(pk) => assert_eq!(ledger.public_key_of(other).await.unwrap(), *pk),
                            None => assert!(matches!(
                                ledger.public_key_of(other).await,
                                Err(LedgerError::NotRegistered(_))
                            )),
                        }
                    }
                }
            });
        }

        /// A stealth transfer either moves the token and appends one
        /// matching record, or changes nothing.
        #[test]
        fn prop_stealth_transfer_all_or_nothing(
            callers in proptest::collection::vec((caller_strategy(), any::<bool>()), 1..8),
        ) {
            let rt = runtime();
            rt.block_on(async {
                let ledger = ledger();
                let token = TokenId::new(42);
                let approved = Address::from_bytes([0xa0; 20]);
                let operator = Address::from_bytes([0xb0; 20]);
                let stranger = Address::from_bytes([0xc0; 20]);
                let receiver = key(7);

                let mut owner = Address::from_bytes([0x01; 20]);
                ledger.mint(&owner, token).await.unwrap();

                for (caller, to_zero) in callers {
                    ledger.approve(&owner, &approved, token).await.unwrap();
                    ledger.set_approval_for_all(&owner, &operator, true).await.unwrap();

                    let caller = match caller {
                        Caller::Owner => owner,
                        Caller::Approved => approved,
                        Caller::Operator => operator,
                        Caller::Stranger => stranger,
                    };
                    let payment = ledger
                        .derive_stealth_address(&receiver.public_key(), &EphemeralSecret::random())
                        .unwrap();
                    let destination = if to_zero { Address::ZERO } else { payment.stealth_address };

                    let before = ledger.record_count().await.unwrap();
                    let result = ledger
                        .stealth_transfer(&caller, &destination, token, &payment.ephemeral)
                        .await;

                    let allowed = caller != stranger && !to_zero;
                    if allowed {
                        let entry = result.unwrap();
                        assert_eq!(entry.seq, before + 1);
                        assert_eq!(entry.record, payment.to_record());
                        assert_eq!(ledger.owner_of(token).await.unwrap(), destination);
                        assert_eq!(ledger.records_since(before).await.unwrap(), vec![entry]);
                        assert_eq!(ledger.get_approved(token).await.unwrap(), None);
                        owner = destination;
                    } else {
                        assert!(result.is_err());
                        assert_eq!(ledger.owner_of(token).await.unwrap(), owner);
                        assert_eq!(ledger.record_count().await.unwrap(), before);
                        assert_eq!(ledger.get_approved(token).await.unwrap(), Some(approved));
                    }
                }
            });
        }
    }
}
