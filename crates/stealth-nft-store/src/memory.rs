//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use stealth_nft_core::{Address, PublicKey, RecordEntry, TokenId, TransferRecord};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Registered keys by account.
    public_keys: BTreeMap<Address, PublicKey>,

    /// Token owners.
    owners: BTreeMap<TokenId, Address>,

    /// Per-token approvals.
    approvals: HashMap<TokenId, Address>,

    /// (owner, operator) pairs.
    operators: BTreeSet<(Address, Address)>,

    /// Record log; entry `i` has seq `i + 1`.
    records: Vec<RecordEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_public_key(&self, account: &Address) -> Result<Option<PublicKey>> {
        Ok(self.read()?.public_keys.get(account).copied())
    }

    async fn put_public_key(&self, account: &Address, key: &PublicKey) -> Result<()> {
        self.write()?.public_keys.insert(*account, *key);
        Ok(())
    }

    async fn list_registered(&self) -> Result<Vec<Address>> {
        Ok(self.read()?.public_keys.keys().copied().collect())
    }

    async fn insert_token(&self, token_id: TokenId, owner: &Address) -> Result<()> {
        let mut inner = self.write()?;
        if inner.owners.contains_key(&token_id) {
            return Err(StoreError::TokenExists(token_id));
        }
        inner.owners.insert(token_id, *owner);
        Ok(())
    }

    async fn get_owner(&self, token_id: TokenId) -> Result<Option<Address>> {
        Ok(self.read()?.owners.get(&token_id).copied())
    }

    async fn balance_of(&self, owner: &Address) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.owners.values().filter(|o| *o == owner).count() as u64)
    }

    async fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>> {
        let inner = self.read()?;
        Ok(inner
            .owners
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn get_approval(&self, token_id: TokenId) -> Result<Option<Address>> {
        Ok(self.read()?.approvals.get(&token_id).copied())
    }

    async fn set_approval(&self, token_id: TokenId, approved: Option<&Address>) -> Result<()> {
        let mut inner = self.write()?;
        match approved {
            Some(addr) => {
                inner.approvals.insert(token_id, *addr);
            }
            None => {
                inner.approvals.remove(&token_id);
            }
        }
        Ok(())
    }

    async fn is_operator(&self, owner: &Address, operator: &Address) -> Result<bool> {
        Ok(self.read()?.operators.contains(&(*owner, *operator)))
    }

    async fn set_operator(
        &self,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let mut inner = self.write()?;
        if approved {
            inner.operators.insert((*owner, *operator));
        } else {
            inner.operators.remove(&(*owner, *operator));
        }
        Ok(())
    }

    async fn commit_transfer(
        &self,
        token_id: TokenId,
        from: &Address,
        to: &Address,
        record: Option<&TransferRecord>,
        now: i64,
    ) -> Result<Option<u64>> {
        let mut inner = self.write()?;

        let actual = inner.owners.get(&token_id).copied();
        if actual != Some(*from) {
            return Err(StoreError::OwnerMismatch {
                token_id,
                expected: *from,
                actual,
            });
        }

        inner.owners.insert(token_id, *to);
        inner.approvals.remove(&token_id);

        Ok(record.map(|record| {
            let seq = inner.records.len() as u64 + 1;
            inner.records.push(RecordEntry {
                seq,
                record: *record,
                recorded_at: now,
            });
            seq
        }))
    }

    async fn records_since(&self, after_seq: u64, limit: usize) -> Result<Vec<RecordEntry>> {
        let inner = self.read()?;
        let start = usize::try_from(after_seq).unwrap_or(usize::MAX);
        Ok(inner
            .records
            .iter()
            .skip(start)
            .take(limit)
            .copied()
            .collect())
    }

    async fn record_count(&self) -> Result<u64> {
        Ok(self.read()?.records.len() as u64)
    }
}
