//! Stealth transfer: an ordinary authorized transfer to a derived address,
//! committed together with the public record receivers scan for.

use stealth_nft_core::{Address, CoreError, EphemeralPoint, RecordEntry, TokenId, TransferRecord};
use stealth_nft_store::{now_millis, Store, StoreError};
use tracing::{info, warn};

use crate::error::{LedgerError, Result};
use crate::ownership::OwnershipLedger;

pub struct TransferProtocol<S: Store> {
    ownership: OwnershipLedger<S>,
    validate_ephemeral_points: bool,
}

impl<S: Store> TransferProtocol<S> {
    pub fn new(ownership: OwnershipLedger<S>, validate_ephemeral_points: bool) -> Self {
        Self {
            ownership,
            validate_ephemeral_points,
        }
    }

    /// Move `token_id` from its current owner to `stealth_address` and
    /// append `(stealth_address, R.x, R.y)` to the record log.
    ///
    /// Authorization and failure modes are those of
    /// [`OwnershipLedger::transfer_from`]. The ownership change and the
    /// record are one store commit: both land or neither does.
    pub async fn stealth_transfer(
        &self,
        caller: &Address,
        stealth_address: &Address,
        token_id: TokenId,
        ephemeral: &EphemeralPoint,
    ) -> Result<RecordEntry> {
        if self.validate_ephemeral_points && !ephemeral.is_on_curve() {
            warn!(token_id = %token_id, "rejected stealth transfer: ephemeral point off curve");
            return Err(LedgerError::Core(CoreError::InvalidInput(
                "ephemeral point not on curve".into(),
            )));
        }

        let from = self.ownership.owner_of(token_id).await?;
        let record = TransferRecord::new(*stealth_address, *ephemeral);
        let recorded_at = now_millis();

        let seq = self
            .ownership
            .move_token(caller, &from, stealth_address, token_id, Some(&record), recorded_at)
            .await?
            .ok_or_else(|| {
                LedgerError::Store(StoreError::InvalidData(
                    "transfer with record returned no sequence number".into(),
                ))
            })?;

        info!(
            token_id = %token_id,
            stealth_address = %stealth_address,
            seq,
            "stealth transfer"
        );

        Ok(RecordEntry {
            seq,
            record,
            recorded_at,
        })
    }
}

impl<S: Store> Clone for TransferProtocol<S> {
    fn clone(&self) -> Self {
        Self {
            ownership: self.ownership.clone(),
            validate_ephemeral_points: self.validate_ephemeral_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stealth_nft_core::{derive_stealth_address, EphemeralSecret, SecretKey};
    use stealth_nft_store::MemoryStore;

    type Parts = (
        Arc<MemoryStore>,
        OwnershipLedger<MemoryStore>,
        TransferProtocol<MemoryStore>,
    );

    fn setup(validate: bool) -> Parts {
        let store = Arc::new(MemoryStore::new());
        let ownership = OwnershipLedger::new(Arc::clone(&store));
        let protocol = TransferProtocol::new(ownership.clone(), validate);
        (store, ownership, protocol)
    }

    #[tokio::test]
    async fn test_stealth_transfer_records_and_moves() {
        let (store, ownership, protocol) = setup(false);
        let sender = Address::from_bytes([1; 20]);
        ownership.mint(&sender, TokenId::new(10)).await.unwrap();

        let receiver = SecretKey::generate();
        let payment =
            derive_stealth_address(&receiver.public_key(), &EphemeralSecret::random()).unwrap();

        let entry = protocol
            .stealth_transfer(
                &sender,
                &payment.stealth_address,
                TokenId::new(10),
                &payment.ephemeral,
            )
            .await
            .unwrap();

        assert_eq!(entry.seq, 1);
        assert_eq!(entry.record, payment.to_record());
        assert_eq!(
            ownership.owner_of(TokenId::new(10)).await.unwrap(),
            payment.stealth_address
        );
        assert_eq!(store.records_since(0, 10).await.unwrap()[0].record, entry.record);
    }

    #[tokio::test]
    async fn test_unauthorized_stealth_transfer_changes_nothing() {
        let (store, ownership, protocol) = setup(false);
        let owner = Address::from_bytes([1; 20]);
        let stranger = Address::from_bytes([2; 20]);
        ownership.mint(&owner, TokenId::new(10)).await.unwrap();

        let r = EphemeralSecret::random().ephemeral_point();
        let err = protocol
            .stealth_transfer(&stranger, &Address::from_bytes([3; 20]), TokenId::new(10), &r)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert_eq!(ownership.owner_of(TokenId::new(10)).await.unwrap(), owner);
        assert_eq!(store.record_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_off_curve_ephemeral_checked_only_when_configured() {
        let owner = Address::from_bytes([1; 20]);
        let bad = EphemeralPoint::from_coordinates([1; 32], [2; 32]);

        let (store, ownership, protocol) = setup(true);
        ownership.mint(&owner, TokenId::new(1)).await.unwrap();
        let err = protocol
            .stealth_transfer(&owner, &Address::from_bytes([3; 20]), TokenId::new(1), &bad)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(store.record_count().await.unwrap(), 0);

        let (store, ownership, protocol) = setup(false);
        ownership.mint(&owner, TokenId::new(1)).await.unwrap();
        protocol
            .stealth_transfer(&owner, &Address::from_bytes([3; 20]), TokenId::new(1), &bad)
            .await
            .unwrap();
        assert_eq!(store.record_count().await.unwrap(), 1);
    }
}
