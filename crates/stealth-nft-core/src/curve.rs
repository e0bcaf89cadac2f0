//! secp256k1 arithmetic primitive.
//!
//! Thin, strongly typed layer over `k256`: point addition, scalar
//! multiplication, point validation, hashing into the scalar field, and
//! address derivation. Arithmetic is constant time. No randomness is drawn
//! here; callers supply every scalar.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{AffinePoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar, U256};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::keys::PublicKey;
use crate::types::{Address, ADDRESS_LEN};
use crate::validation::validate_point;

/// Domain tag prepended to the shared-secret coordinates before hashing.
pub const STEALTH_DOMAIN: &[u8] = b"stealth-nft/shared-secret/v1";

/// A validated curve point. Never the identity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint(AffinePoint);

impl CurvePoint {
    /// The base point G.
    pub const GENERATOR: Self = Self(AffinePoint::GENERATOR);

    /// Validate coordinates and build a point.
    pub fn from_coordinates(x: &[u8; 32], y: &[u8; 32]) -> Result<Self> {
        validate_point(x, y).map(Self)
    }

    /// Validate a public key and build a point.
    pub fn from_public_key(key: &PublicKey) -> Result<Self> {
        Self::from_coordinates(&key.x, &key.y)
    }

    fn from_projective(point: ProjectivePoint) -> Result<Self> {
        let affine = point.to_affine();
        if affine == AffinePoint::IDENTITY {
            return Err(CoreError::invalid_input("result is the point at infinity"));
        }
        Ok(Self(affine))
    }

    /// Big-endian affine coordinates.
    pub fn coordinates(&self) -> ([u8; 32], [u8; 32]) {
        let encoded = self.0.to_encoded_point(false);
        // Uncompressed SEC1: 0x04 || x || y. The identity is excluded by construction.
        let bytes = encoded.as_bytes();
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[1..33]);
        y.copy_from_slice(&bytes[33..65]);
        (x, y)
    }

    /// Convert to the registry representation.
    pub fn to_public_key(&self) -> PublicKey {
        let (x, y) = self.coordinates();
        PublicKey { x, y }
    }

    pub(crate) fn to_projective(self) -> ProjectivePoint {
        ProjectivePoint::from(self.0)
    }
}

impl fmt::Debug for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, _) = self.coordinates();
        write!(f, "CurvePoint({}...)", &hex::encode(x)[..16])
    }
}

/// Check that a public key lies on the curve.
pub fn is_on_curve(key: &PublicKey) -> bool {
    validate_point(&key.x, &key.y).is_ok()
}

/// `p + q`. Fails if the sum is the identity.
pub fn add(p: &CurvePoint, q: &CurvePoint) -> Result<CurvePoint> {
    CurvePoint::from_projective(p.to_projective() + q.to_projective())
}

/// `k * p`. Fails for `k = 0`.
pub fn scalar_mul(k: &Scalar, p: &CurvePoint) -> Result<CurvePoint> {
    if bool::from(k.is_zero()) {
        return Err(CoreError::invalid_input("scalar multiplication by zero"));
    }
    CurvePoint::from_projective(p.to_projective() * k)
}

/// `k * G`. Fails for `k = 0`.
pub fn scalar_base_mul(k: &Scalar) -> Result<CurvePoint> {
    if bool::from(k.is_zero()) {
        return Err(CoreError::invalid_input("scalar multiplication by zero"));
    }
    CurvePoint::from_projective(ProjectivePoint::GENERATOR * k)
}

/// `k * G` for a non-zero scalar. The group has prime order, so the
/// result is never the identity.
pub(crate) fn base_mul_nonzero(k: &NonZeroScalar) -> CurvePoint {
    CurvePoint((ProjectivePoint::GENERATOR * k.as_ref()).to_affine())
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Address of a point: last 20 bytes of `keccak256(x || y)`.
pub fn derive_address(point: &CurvePoint) -> Address {
    let (x, y) = point.coordinates();
    let mut hasher = Keccak256::new();
    hasher.update(x);
    hasher.update(y);
    let hash: [u8; 32] = hasher.finalize().into();

    let mut addr = [0u8; ADDRESS_LEN];
    addr.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    Address(addr)
}

/// Hash a shared-secret point into the scalar field.
///
/// `h = keccak256(STEALTH_DOMAIN || x || y) mod n`. Sender and receiver
/// must use this exact function.
pub fn hash_to_scalar(point: &CurvePoint) -> Scalar {
    let (x, y) = point.coordinates();
    let mut hasher = Keccak256::new();
    hasher.update(STEALTH_DOMAIN);
    hasher.update(x);
    hasher.update(y);
    let digest: [u8; 32] = hasher.finalize().into();

    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(digest))
}
