//! Input validation: scalar range checks and hex parsing.
//!
//! Every scalar that enters the core passes through [`validate_scalar`],
//! every coordinate pair through [`validate_point`].

use k256::elliptic_curve::sec1::FromEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, Scalar};

use zeroize::Zeroizing;

use crate::error::{CoreError, Result};

/// Check that `bytes` (big-endian) encodes a scalar in `[1, n-1]`.
pub fn validate_scalar(bytes: &[u8; 32]) -> Result<NonZeroScalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(FieldBytes::from(*bytes)).into();
    let scalar = scalar.ok_or_else(|| CoreError::invalid_input("scalar not below group order"))?;

    Option::from(NonZeroScalar::new(scalar))
        .ok_or_else(|| CoreError::invalid_input("scalar is zero"))
}

/// Check that `(x, y)` is an affine point on the curve.
///
/// Coordinates must be below the field prime and satisfy the curve
/// equation. The identity has no affine coordinates and is never accepted.
pub fn validate_point(x: &[u8; 32], y: &[u8; 32]) -> Result<AffinePoint> {
    let encoded =
        EncodedPoint::from_affine_coordinates(&FieldBytes::from(*x), &FieldBytes::from(*y), false);

    Option::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| CoreError::invalid_input("point not on curve"))
}

/// Parse a big-endian 256-bit value from hex.
///
/// Accepts an optional `0x` prefix and fewer than 64 digits (the value is
/// left-padded with zeros), so `"0xaaa"` parses to `0x0...0aaa`.
pub fn parse_u256_hex(s: &str) -> Result<[u8; 32]> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Err(CoreError::DecodingError("empty hex string".into()));
    }
    if digits.len() > 64 {
        return Err(CoreError::DecodingError(format!(
            "hex value has {} digits, at most 64 allowed",
            digits.len()
        )));
    }

    let mut padded = Zeroizing::new(String::with_capacity(64));
    for _ in digits.len()..64 {
        padded.push('0');
    }
    padded.push_str(digits);

    let mut out = [0u8; 32];
    hex::decode_to_slice(padded.as_str(), &mut out)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    Ok(out)
}
