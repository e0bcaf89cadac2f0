//! Key material: public keys (curve points as coordinate pairs), secret
//! keys, and ephemeral secrets.

use k256::elliptic_curve::subtle::ConstantTimeEq;
use k256::{NonZeroScalar, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::curve::{self, CurvePoint};
use crate::error::{CoreError, Result};
use crate::types::Address;
use crate::validation::{parse_u256_hex, validate_scalar};

/// A public key as stored in the registry: big-endian affine coordinates.
///
/// Construction does not validate; use [`PublicKey::is_on_curve`] or
/// [`CurvePoint::from_public_key`] before doing arithmetic with it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub x: [u8; 32],
    pub y: [u8; 32],
}

/// The ephemeral point `R = r·G` published with a stealth transfer.
pub type EphemeralPoint = PublicKey;

impl PublicKey {
    /// Create from raw coordinates.
    pub const fn from_coordinates(x: [u8; 32], y: [u8; 32]) -> Self {
        Self { x, y }
    }

    /// Parse coordinates from hex (optional `0x`, left-padded).
    pub fn from_hex_coordinates(x: &str, y: &str) -> Result<Self> {
        Ok(Self {
            x: parse_u256_hex(x)?,
            y: parse_u256_hex(y)?,
        })
    }

    /// Parse an uncompressed SEC1 key: `0x04 || x || y` (65 bytes) or the
    /// bare 64-byte `x || y` form wallets often export.
    pub fn from_sec1_uncompressed(bytes: &[u8]) -> Result<Self> {
        let body = match bytes.len() {
            65 if bytes[0] == 0x04 => &bytes[1..],
            64 => bytes,
            n => {
                return Err(CoreError::DecodingError(format!(
                    "expected 64 or 65 byte uncompressed key, got {} bytes",
                    n
                )))
            }
        };
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&body[..32]);
        y.copy_from_slice(&body[32..]);
        Ok(Self { x, y })
    }

    /// `0x04 || x || y`.
    pub fn to_sec1_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x);
        out[33..].copy_from_slice(&self.y);
        out
    }

    /// Whether the coordinates satisfy the curve equation.
    pub fn is_on_curve(&self) -> bool {
        curve::is_on_curve(self)
    }

    /// Check the key is acceptable for registration. Fails with
    /// `InvalidPublicKey` when the point is not on the curve.
    pub fn validate(&self) -> Result<()> {
        if self.is_on_curve() {
            Ok(())
        } else {
            Err(CoreError::InvalidPublicKey)
        }
    }

    /// Address controlled by the matching private key.
    pub fn address(&self) -> Result<Address> {
        Ok(curve::derive_address(&CurvePoint::from_public_key(self)?))
    }

    pub fn x_hex(&self) -> String {
        format!("0x{}", hex::encode(self.x))
    }

    pub fn y_hex(&self) -> String {
        format!("0x{}", hex::encode(self.y))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey(x={}..., y={}...)",
            &hex::encode(self.x)[..12],
            &hex::encode(self.y)[..12]
        )
    }
}

/// A secp256k1 private key: a scalar in `[1, n-1]`.
///
/// Used for receiver keys and for recovered stealth keys. The scalar is
/// wiped when the key is dropped.
#[derive(Clone)]
pub struct SecretKey(NonZeroScalar);

impl SecretKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(NonZeroScalar::random(&mut rng))
    }

    /// Create from big-endian bytes. Fails with `InvalidInput` for zero or
    /// values not below the group order.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self> {
        validate_scalar(bytes).map(Self)
    }

    /// Parse from hex (optional `0x`, left-padded).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(parse_u256_hex(s)?);
        Self::from_be_bytes(&bytes)
    }

    pub(crate) fn from_scalar(scalar: Scalar) -> Result<Self> {
        Option::from(NonZeroScalar::new(scalar))
            .map(Self)
            .ok_or_else(|| CoreError::InvalidInput("derived key is zero".into()))
    }

    /// Big-endian secret bytes.
    pub fn to_be_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.0.to_bytes().into())
    }

    /// Hex with `0x` prefix, the form wallets import.
    pub fn to_hex(&self) -> Zeroizing<String> {
        let digits = Zeroizing::new(hex::encode(self.to_be_bytes().as_slice()));
        let mut out = Zeroizing::new(String::with_capacity(66));
        out.push_str("0x");
        out.push_str(&digits);
        out
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.0
    }

    /// The matching public key `d·G`.
    pub fn public_key(&self) -> PublicKey {
        self.public_point().to_public_key()
    }

    pub(crate) fn public_point(&self) -> CurvePoint {
        curve::base_mul_nonzero(&self.0)
    }

    /// Address controlled by this key.
    pub fn address(&self) -> Address {
        curve::derive_address(&self.public_point())
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.0.as_ref().ct_eq(other.0.as_ref()))
    }
}

impl Eq for SecretKey {}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({:?})", self.address())
    }
}

/// The sender's one-time scalar `r`.
///
/// Callers must use a fresh, high-entropy secret for every transfer. Reusing
/// one across receivers or transfers lets observers link the resulting
/// stealth addresses through the shared ephemeral point. The core does not
/// track or reject reuse.
#[derive(Clone)]
pub struct EphemeralSecret(SecretKey);

impl EphemeralSecret {
    /// Draw a fresh random secret.
    pub fn random() -> Self {
        Self(SecretKey::generate())
    }

    /// Create from big-endian bytes. Fails with `InvalidInput` for zero or
    /// values not below the group order.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self> {
        SecretKey::from_be_bytes(bytes).map(Self)
    }

    /// Parse from hex (optional `0x`, left-padded).
    pub fn from_hex(s: &str) -> Result<Self> {
        SecretKey::from_hex(s).map(Self)
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        self.0.scalar()
    }

    /// The ephemeral point `R = r·G`.
    pub fn ephemeral_point(&self) -> EphemeralPoint {
        self.0.public_key()
    }
}

// The inner key wipes itself.
impl ZeroizeOnDrop for EphemeralSecret {}

impl fmt::Debug for EphemeralSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EphemeralSecret(..)")
    }
}
