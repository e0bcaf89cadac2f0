//! Transfer records: the public signal emitted by every stealth transfer.
//!
//! A record carries the destination address and the ephemeral point `R`.
//! Nothing else is published; in particular the token id is not part of
//! the record, so scanning a record reveals only that some token moved to
//! that address.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::EphemeralPoint;
use crate::types::Address;

/// `(stealthAddress, R.x, R.y)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRecord {
    pub stealth_address: Address,
    pub ephemeral: EphemeralPoint,
}

impl TransferRecord {
    pub fn new(stealth_address: Address, ephemeral: EphemeralPoint) -> Self {
        Self {
            stealth_address,
            ephemeral,
        }
    }

    /// `R.x` as big-endian bytes.
    pub fn ephemeral_x(&self) -> &[u8; 32] {
        &self.ephemeral.x
    }

    /// `R.y` as big-endian bytes.
    pub fn ephemeral_y(&self) -> &[u8; 32] {
        &self.ephemeral.y
    }
}

impl fmt::Debug for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRecord")
            .field("stealth_address", &self.stealth_address)
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}

/// A record as stored in the append-only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Position in the log. Starts at 1, no gaps.
    pub seq: u64,
    pub record: TransferRecord,
    /// When the record was appended (Unix ms).
    pub recorded_at: i64,
}
