//! Conventional token ownership: mint, owner lookup, approvals, and
//! authorized transfers.
//!
//! Authorization follows the usual non-fungible token rules. A caller may
//! move a token when it is the owner, the token's approved address, or an
//! operator of the owner. Every transfer clears the token's approval.
//!
//! Methods here do a read-then-write against the store. They assume the
//! caller serializes mutations; [`crate::Ledger`] does.

use std::sync::Arc;

use stealth_nft_core::{Address, TokenId, TransferRecord};
use stealth_nft_store::{now_millis, Store, StoreError};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};

pub struct OwnershipLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> OwnershipLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create `token_id` owned by `owner`.
    pub async fn mint(&self, owner: &Address, token_id: TokenId) -> Result<()> {
        if owner.is_zero() {
            warn!(token_id = %token_id, "rejected mint to zero address");
            return Err(LedgerError::InvalidRecipient);
        }

        match self.store.insert_token(token_id, owner).await {
            Ok(()) => {
                info!(token_id = %token_id, owner = %owner, "minted token");
                Ok(())
            }
            Err(StoreError::TokenExists(id)) => {
                warn!(token_id = %id, "rejected mint: token exists");
                Err(LedgerError::TokenExists(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.store
            .get_owner(token_id)
            .await?
            .ok_or(LedgerError::NonexistentToken(token_id))
    }

    pub async fn balance_of(&self, owner: &Address) -> Result<u64> {
        Ok(self.store.balance_of(owner).await?)
    }

    pub async fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>> {
        Ok(self.store.tokens_of(owner).await?)
    }

    /// Approve `approved` to move `token_id`. The zero address clears the
    /// approval. Only the owner or an operator of the owner may approve.
    pub async fn approve(
        &self,
        caller: &Address,
        approved: &Address,
        token_id: TokenId,
    ) -> Result<()> {
        let owner = self.owner_of(token_id).await?;
        if *caller != owner && !self.store.is_operator(&owner, caller).await? {
            warn!(caller = %caller, token_id = %token_id, "rejected approve");
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                token_id,
            });
        }

        let approved = (!approved.is_zero()).then_some(approved);
        self.store.set_approval(token_id, approved).await?;
        debug!(token_id = %token_id, approved = ?approved, "set approval");
        Ok(())
    }

    /// The approved address for an existing token.
    pub async fn get_approved(&self, token_id: TokenId) -> Result<Option<Address>> {
        self.owner_of(token_id).await?;
        Ok(self.store.get_approval(token_id).await?)
    }

    /// Let `operator` manage every token `caller` owns, now and later.
    /// The zero address cannot be an operator.
    pub async fn set_approval_for_all(
        &self,
        caller: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        if operator.is_zero() {
            warn!(owner = %caller, "rejected zero address as operator");
            return Err(LedgerError::InvalidRecipient);
        }

        self.store.set_operator(caller, operator, approved).await?;
        debug!(owner = %caller, operator = %operator, approved, "set operator");
        Ok(())
    }

    pub async fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> Result<bool> {
        Ok(self.store.is_operator(owner, operator).await?)
    }

    /// Standard authorized transfer.
    pub async fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<()> {
        self.move_token(caller, from, to, token_id, None, now_millis())
            .await?;
        info!(token_id = %token_id, from = %from, to = %to, "transferred token");
        Ok(())
    }

    /// Check `caller` may move the token and return its owner.
    pub(crate) async fn authorize(&self, caller: &Address, token_id: TokenId) -> Result<Address> {
        let owner = self.owner_of(token_id).await?;
        if *caller == owner {
            return Ok(owner);
        }
        if self.store.get_approval(token_id).await? == Some(*caller) {
            return Ok(owner);
        }
        if self.store.is_operator(&owner, caller).await? {
            return Ok(owner);
        }

        warn!(caller = %caller, token_id = %token_id, "rejected transfer: unauthorized");
        Err(LedgerError::Unauthorized {
            caller: *caller,
            token_id,
        })
    }

    /// Authorize, then move the token and append `record` in one store
    /// commit. Returns the record's sequence number when one was given.
    pub(crate) async fn move_token(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
        record: Option<&TransferRecord>,
        now: i64,
    ) -> Result<Option<u64>> {
        if to.is_zero() {
            warn!(token_id = %token_id, "rejected transfer to zero address");
            return Err(LedgerError::InvalidRecipient);
        }

        let owner = self.authorize(caller, token_id).await?;
        if owner != *from {
            warn!(token_id = %token_id, from = %from, "rejected transfer: from is not the owner");
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                token_id,
            });
        }

        match self
            .store
            .commit_transfer(token_id, from, to, record, now)
            .await
        {
            Ok(seq) => Ok(seq),
            Err(StoreError::OwnerMismatch { actual: None, .. }) => {
                Err(LedgerError::NonexistentToken(token_id))
            }
            Err(StoreError::OwnerMismatch { .. }) => Err(LedgerError::Unauthorized {
                caller: *caller,
                token_id,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: Store> Clone for OwnershipLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
