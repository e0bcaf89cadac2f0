//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use stealth_nft_core::{Address, PublicKey, RecordEntry, TokenId, TransferRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and its parent directory) and runs migrations if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` on the connection from the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

/// Read a fixed-width blob column.
fn blob<const N: usize>(row: &Row<'_>, idx: usize, name: &str) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, name.into(), Type::Blob))
}

fn address(row: &Row<'_>, idx: usize, name: &str) -> rusqlite::Result<Address> {
    blob::<20>(row, idx, name).map(Address::from_bytes)
}

// Token ids are u64; SQLite integers are i64. Stored bit-for-bit.
fn token_to_sql(id: TokenId) -> i64 {
    id.value() as i64
}

fn token_from_sql(v: i64) -> TokenId {
    TokenId::new(v as u64)
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<RecordEntry> {
    let seq: i64 = row.get(0)?;
    let stealth_address = address(row, 1, "stealth_address")?;
    let x = blob::<32>(row, 2, "ephemeral_x")?;
    let y = blob::<32>(row, 3, "ephemeral_y")?;

    Ok(RecordEntry {
        seq: seq as u64,
        record: TransferRecord::new(stealth_address, PublicKey::from_coordinates(x, y)),
        recorded_at: row.get(4)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_public_key(&self, account: &Address) -> Result<Option<PublicKey>> {
        let account = *account;
        self.run(move |conn| {
            let key = conn
                .query_row(
                    "SELECT x, y FROM public_keys WHERE account = ?1",
                    params![account.as_bytes().as_slice()],
                    |row| {
                        Ok(PublicKey::from_coordinates(
                            blob::<32>(row, 0, "x")?,
                            blob::<32>(row, 1, "y")?,
                        ))
                    },
                )
                .optional()?;
            Ok(key)
        })
        .await
    }

    async fn put_public_key(&self, account: &Address, key: &PublicKey) -> Result<()> {
        let account = *account;
        let key = *key;
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO public_keys (account, x, y, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(account) DO UPDATE SET
                    x = excluded.x,
                    y = excluded.y,
                    updated_at = excluded.updated_at",
                params![
                    account.as_bytes().as_slice(),
                    key.x.as_slice(),
                    key.y.as_slice(),
                    crate::now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_registered(&self) -> Result<Vec<Address>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT account FROM public_keys ORDER BY account")?;
            let accounts = stmt
                .query_map([], |row| address(row, 0, "account"))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(accounts)
        })
        .await
    }

    async fn insert_token(&self, token_id: TokenId, owner: &Address) -> Result<()> {
        let owner = *owner;
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO tokens (token_id, owner) VALUES (?1, ?2)",
                params![token_to_sql(token_id), owner.as_bytes().as_slice()],
            )?;
            if inserted == 0 {
                return Err(StoreError::TokenExists(token_id));
            }
            Ok(())
        })
        .await
    }

    async fn get_owner(&self, token_id: TokenId) -> Result<Option<Address>> {
        self.run(move |conn| {
            let owner = conn
                .query_row(
                    "SELECT owner FROM tokens WHERE token_id = ?1",
                    params![token_to_sql(token_id)],
                    |row| address(row, 0, "owner"),
                )
                .optional()?;
            Ok(owner)
        })
        .await
    }

    async fn balance_of(&self, owner: &Address) -> Result<u64> {
        let owner = *owner;
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tokens WHERE owner = ?1",
                params![owner.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>> {
        let owner = *owner;
        self.run(move |conn| {
            let mut stmt = conn.prepare("SELECT token_id FROM tokens WHERE owner = ?1")?;
            let mut ids = stmt
                .query_map(params![owner.as_bytes().as_slice()], |row| {
                    row.get::<_, i64>(0).map(token_from_sql)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            // Sort as u64; SQL ordering on the i64 form differs above i64::MAX.
            ids.sort();
            Ok(ids)
        })
        .await
    }

    async fn get_approval(&self, token_id: TokenId) -> Result<Option<Address>> {
        self.run(move |conn| {
            let approved = conn
                .query_row(
                    "SELECT approved FROM token_approvals WHERE token_id = ?1",
                    params![token_to_sql(token_id)],
                    |row| address(row, 0, "approved"),
                )
                .optional()?;
            Ok(approved)
        })
        .await
    }

    async fn set_approval(&self, token_id: TokenId, approved: Option<&Address>) -> Result<()> {
        let approved = approved.copied();
        self.run(move |conn| {
            match approved {
                Some(addr) => conn.execute(
                    "INSERT INTO token_approvals (token_id, approved) VALUES (?1, ?2)
                     ON CONFLICT(token_id) DO UPDATE SET approved = excluded.approved",
                    params![token_to_sql(token_id), addr.as_bytes().as_slice()],
                )?,
                None => conn.execute(
                    "DELETE FROM token_approvals WHERE token_id = ?1",
                    params![token_to_sql(token_id)],
                )?,
            };
            Ok(())
        })
        .await
    }

    async fn is_operator(&self, owner: &Address, operator: &Address) -> Result<bool> {
        let owner = *owner;
        let operator = *operator;
        self.run(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM operator_approvals WHERE owner = ?1 AND operator = ?2",
                    params![owner.as_bytes().as_slice(), operator.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn set_operator(
        &self,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let owner = *owner;
        let operator = *operator;
        self.run(move |conn| {
            let sql = if approved {
                "INSERT OR IGNORE INTO operator_approvals (owner, operator) VALUES (?1, ?2)"
            } else {
                "DELETE FROM operator_approvals WHERE owner = ?1 AND operator = ?2"
            };
            conn.execute(
                sql,
                params![owner.as_bytes().as_slice(), operator.as_bytes().as_slice()],
            )?;
            Ok(())
        })
        .await
    }

    async fn commit_transfer(
        &self,
        token_id: TokenId,
        from: &Address,
        to: &Address,
        record: Option<&TransferRecord>,
        now: i64,
    ) -> Result<Option<u64>> {
        let from = *from;
        let to = *to;
        let record = record.copied();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let actual = tx
                .query_row(
                    "SELECT owner FROM tokens WHERE token_id = ?1",
                    params![token_to_sql(token_id)],
                    |row| address(row, 0, "owner"),
                )
                .optional()?;

            if actual != Some(from) {
                // Dropping the transaction rolls it back.
                return Err(StoreError::OwnerMismatch {
                    token_id,
                    expected: from,
                    actual,
                });
            }

            tx.execute(
                "UPDATE tokens SET owner = ?2 WHERE token_id = ?1",
                params![token_to_sql(token_id), to.as_bytes().as_slice()],
            )?;
            tx.execute(
                "DELETE FROM token_approvals WHERE token_id = ?1",
                params![token_to_sql(token_id)],
            )?;

            let seq = match record {
                Some(record) => {
                    let seq: i64 = tx.query_row(
                        "SELECT COALESCE(MAX(seq), 0) + 1 FROM transfer_records",
                        [],
                        |row| row.get(0),
                    )?;
                    tx.execute(
                        "INSERT INTO transfer_records (
                            seq, stealth_address, ephemeral_x, ephemeral_y, recorded_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            seq,
                            record.stealth_address.as_bytes().as_slice(),
                            record.ephemeral.x.as_slice(),
                            record.ephemeral.y.as_slice(),
                            now,
                        ],
                    )?;
                    Some(seq as u64)
                }
                None => None,
            };

            tx.commit()?;
            Ok(seq)
        })
        .await
    }

    async fn records_since(&self, after_seq: u64, limit: usize) -> Result<Vec<RecordEntry>> {
        let after = i64::try_from(after_seq).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, stealth_address, ephemeral_x, ephemeral_y, recorded_at
                 FROM transfer_records
                 WHERE seq > ?1
                 ORDER BY seq
                 LIMIT ?2",
            )?;
            let entries = stmt
                .query_map(params![after, limit], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }

    async fn record_count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM transfer_records", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_nft_core::{EphemeralSecret, SecretKey};

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn record_to(to: Address) -> TransferRecord {
        TransferRecord::new(to, EphemeralSecret::random().ephemeral_point())
    }

    #[tokio::test]
    async fn test_public_key_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let key = SecretKey::generate().public_key();

        store.put_public_key(&addr(1), &key).await.unwrap();
        assert_eq!(store.get_public_key(&addr(1)).await.unwrap(), Some(key));
        assert_eq!(store.get_public_key(&addr(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_public_key_overwrite_leaves_others() {
        let store = SqliteStore::open_memory().unwrap();
        let a = SecretKey::generate().public_key();
        let b = SecretKey::generate().public_key();
        let c = SecretKey::generate().public_key();

        store.put_public_key(&addr(1), &a).await.unwrap();
        store.put_public_key(&addr(2), &b).await.unwrap();
        store.put_public_key(&addr(1), &c).await.unwrap();

        assert_eq!(store.get_public_key(&addr(1)).await.unwrap(), Some(c));
        assert_eq!(store.get_public_key(&addr(2)).await.unwrap(), Some(b));
        assert_eq!(store.list_registered().await.unwrap(), vec![addr(1), addr(2)]);
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        store.insert_token(TokenId::new(10), &addr(1)).await.unwrap();
        let result = store.insert_token(TokenId::new(10), &addr(2)).await;
        assert!(matches!(result, Err(StoreError::TokenExists(_))));
        assert_eq!(store.get_owner(TokenId::new(10)).await.unwrap(), Some(addr(1)));
    }

    #[tokio::test]
    async fn test_large_token_id() {
        let store = SqliteStore::open_memory().unwrap();
        let id = TokenId::new(u64::MAX);
        store.insert_token(id, &addr(1)).await.unwrap();
        store.insert_token(TokenId::new(1), &addr(1)).await.unwrap();

        assert_eq!(store.get_owner(id).await.unwrap(), Some(addr(1)));
        assert_eq!(
            store.tokens_of(&addr(1)).await.unwrap(),
            vec![TokenId::new(1), id]
        );
    }

    #[tokio::test]
    async fn test_commit_transfer_with_record() {
        let store = SqliteStore::open_memory().unwrap();
        let token = TokenId::new(10);
        store.insert_token(token, &addr(1)).await.unwrap();
        store.set_approval(token, Some(&addr(7))).await.unwrap();

        let record = record_to(addr(2));
        let seq = store
            .commit_transfer(token, &addr(1), &addr(2), Some(&record), 42)
            .await
            .unwrap();

        assert_eq!(seq, Some(1));
        assert_eq!(store.get_owner(token).await.unwrap(), Some(addr(2)));
        assert_eq!(store.get_approval(token).await.unwrap(), None);

        let entries = store.records_since(0, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].seq, 1);
        assert_eq!(entries[0].record, record);
        assert_eq!(entries[0].recorded_at, 42);
    }

    #[tokio::test]
    async fn test_commit_transfer_rollback_on_mismatch() {
        let store = SqliteStore::open_memory().unwrap();
        let token = TokenId::new(10);
        store.insert_token(token, &addr(1)).await.unwrap();
        store.set_approval(token, Some(&addr(7))).await.unwrap();

        let result = store
            .commit_transfer(token, &addr(3), &addr(2), Some(&record_to(addr(2))), 0)
            .await;

        assert!(matches!(
            result,
            Err(StoreError::OwnerMismatch { actual: Some(a), .. }) if a == addr(1)
        ));
        assert_eq!(store.get_owner(token).await.unwrap(), Some(addr(1)));
        assert_eq!(store.get_approval(token).await.unwrap(), Some(addr(7)));
        assert_eq!(store.record_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_plain_transfer_appends_nothing() {
        let store = SqliteStore::open_memory().unwrap();
        let token = TokenId::new(1);
        store.insert_token(token, &addr(1)).await.unwrap();

        let seq = store
            .commit_transfer(token, &addr(1), &addr(2), None, 0)
            .await
            .unwrap();
        assert_eq!(seq, None);
        assert_eq!(store.record_count().await.unwrap(), 0);
        assert_eq!(store.balance_of(&addr(2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_operator_toggle() {
        let store = SqliteStore::open_memory().unwrap();
        store.set_operator(&addr(1), &addr(2), true).await.unwrap();
        store.set_operator(&addr(1), &addr(2), true).await.unwrap();
        assert!(store.is_operator(&addr(1), &addr(2)).await.unwrap());
        store.set_operator(&addr(1), &addr(2), false).await.unwrap();
        assert!(!store.is_operator(&addr(1), &addr(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_records_since_limit() {
        let store = SqliteStore::open_memory().unwrap();
        for i in 0..4u64 {
            store.insert_token(TokenId::new(i), &addr(1)).await.unwrap();
            store
                .commit_transfer(TokenId::new(i), &addr(1), &addr(2), Some(&record_to(addr(2))), 0)
                .await
                .unwrap();
        }

        let page = store.records_since(2, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].seq, 3);
        assert_eq!(store.records_since(0, usize::MAX).await.unwrap().len(), 4);
        assert_eq!(store.record_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");
        let key = SecretKey::generate().public_key();
        let record = record_to(addr(2));

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put_public_key(&addr(1), &key).await.unwrap();
            store.insert_token(TokenId::new(10), &addr(1)).await.unwrap();
            store
                .commit_transfer(TokenId::new(10), &addr(1), &addr(2), Some(&record), 1)
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_public_key(&addr(1)).await.unwrap(), Some(key));
        assert_eq!(store.get_owner(TokenId::new(10)).await.unwrap(), Some(addr(2)));
        assert_eq!(store.records_since(0, 10).await.unwrap()[0].record, record);
    }
}
