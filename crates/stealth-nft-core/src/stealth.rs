//! Stealth address derivation.
//!
//! Sender side ([`derive_stealth_address`]):
//!
//! ```text
//! R = r·G
//! S = r·P
//! h = keccak256(STEALTH_DOMAIN || S.x || S.y) mod n
//! stealth = P + h·G
//! ```
//!
//! Receiver side ([`recover_stealth_private_key`]):
//!
//! ```text
//! S' = d·R            (= S, since r·(d·G) = d·(r·G))
//! stealth_key = d + h mod n
//! ```
//!
//! Both sides are pure functions of their inputs and safe to call from any
//! number of threads.

use serde::{Deserialize, Serialize};

use crate::curve::{self, CurvePoint};
use crate::error::Result;
use crate::keys::{EphemeralPoint, EphemeralSecret, PublicKey, SecretKey};
use crate::record::{RecordEntry, TransferRecord};
use crate::types::Address;

/// Output of the sender-side derivation: where to send the token and what
/// to publish alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    pub stealth_address: Address,
    pub ephemeral: EphemeralPoint,
}

impl StealthPayment {
    /// The record a transfer to this payment publishes.
    pub fn to_record(&self) -> TransferRecord {
        TransferRecord::new(self.stealth_address, self.ephemeral)
    }
}

/// Derive a one-time address for `receiver` using the sender's ephemeral
/// secret.
///
/// Fails with `InvalidInput` if `receiver` is not on the curve. The secret
/// is range-checked when it is constructed.
pub fn derive_stealth_address(
    receiver: &PublicKey,
    secret: &EphemeralSecret,
) -> Result<StealthPayment> {
    let receiver_point = CurvePoint::from_public_key(receiver)?;
    let r = secret.scalar();

    let ephemeral = curve::scalar_base_mul(r)?;
    let shared = curve::scalar_mul(r, &receiver_point)?;
    let stealth_point = stealth_public_point(&receiver_point, &shared)?;

    Ok(StealthPayment {
        stealth_address: curve::derive_address(&stealth_point),
        ephemeral: ephemeral.to_public_key(),
    })
}

/// Derive the stealth public key (not just its address).
pub fn derive_stealth_public_key(
    receiver: &PublicKey,
    secret: &EphemeralSecret,
) -> Result<PublicKey> {
    let receiver_point = CurvePoint::from_public_key(receiver)?;
    let shared = curve::scalar_mul(secret.scalar(), &receiver_point)?;
    Ok(stealth_public_point(&receiver_point, &shared)?.to_public_key())
}

fn stealth_public_point(receiver: &CurvePoint, shared: &CurvePoint) -> Result<CurvePoint> {
    let h = curve::hash_to_scalar(shared);
    curve::add(receiver, &curve::scalar_base_mul(&h)?)
}

/// Recover the private key controlling the stealth address derived for
/// `receiver`'s public key and the published point `ephemeral`.
///
/// Fails with `InvalidInput` if `ephemeral` is not on the curve.
pub fn recover_stealth_private_key(
    receiver: &SecretKey,
    ephemeral: &EphemeralPoint,
) -> Result<SecretKey> {
    let r_point = CurvePoint::from_public_key(ephemeral)?;
    let shared = curve::scalar_mul(receiver.scalar(), &r_point)?;
    let h = curve::hash_to_scalar(&shared);

    SecretKey::from_scalar(*receiver.scalar() + h)
}

/// Whether `private` is the secret for `public`.
pub fn verify_key_pair(private: &SecretKey, public: &PublicKey) -> bool {
    private.public_key() == *public
}

/// If `record` is addressed to the holder of `receiver`, the stealth key
/// controlling its address.
pub fn check_record(receiver: &SecretKey, record: &TransferRecord) -> Option<SecretKey> {
    let key = recover_stealth_private_key(receiver, &record.ephemeral).ok()?;
    (key.address() == record.stealth_address).then_some(key)
}

/// A record found by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    pub seq: u64,
    pub stealth_address: Address,
    pub stealth_key: SecretKey,
}

/// Find the entries addressed to the holder of `receiver`.
///
/// Entries whose ephemeral point is not on the curve cannot belong to
/// anyone and are skipped.
pub fn scan<'a, I>(receiver: &SecretKey, entries: I) -> Vec<ScanMatch>
where
    I: IntoIterator<Item = &'a RecordEntry>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            check_record(receiver, &entry.record).map(|stealth_key| ScanMatch {
                seq: entry.seq,
                stealth_address: entry.record.stealth_address,
                stealth_key,
            })
        })
        .collect()
}
