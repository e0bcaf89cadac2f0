//! Proptest generators for property-based testing.

use proptest::prelude::*;

use stealth_nft_core::{
    derive_stealth_address, validation::validate_scalar, Address, EphemeralSecret, PublicKey,
    SecretKey, StealthPayment, TokenId,
};

/// 32 bytes that form a valid non-zero scalar.
pub fn scalar_bytes() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>().prop_filter("scalar in [1, n-1]", |b| validate_scalar(b).is_ok())
}

/// Generate a random secret key.
pub fn secret_key() -> impl Strategy<Value = SecretKey> {
    scalar_bytes().prop_filter_map("valid secret key", |b| SecretKey::from_be_bytes(&b).ok())
}

/// Generate a random ephemeral secret.
pub fn ephemeral_secret() -> impl Strategy<Value = EphemeralSecret> {
    scalar_bytes().prop_filter_map("valid ephemeral secret", |b| {
        EphemeralSecret::from_be_bytes(&b).ok()
    })
}

/// A secret key and its public key.
pub fn key_pair() -> impl Strategy<Value = (SecretKey, PublicKey)> {
    secret_key().prop_map(|sk| {
        let pk = sk.public_key();
        (sk, pk)
    })
}

/// Generate an arbitrary non-zero address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>()
        .prop_filter("non-zero address", |b| *b != [0u8; 20])
        .prop_map(Address::from_bytes)
}

pub fn token_id() -> impl Strategy<Value = TokenId> {
    any::<u64>().prop_map(TokenId::new)
}

/// Coordinates that are almost certainly off the curve.
pub fn off_curve_point() -> impl Strategy<Value = PublicKey> {
    (any::<[u8; 32]>(), any::<[u8; 32]>())
        .prop_map(|(x, y)| PublicKey::from_coordinates(x, y))
        .prop_filter("off curve", |pk| !pk.is_on_curve())
}

/// Inputs of one stealth derivation.
#[derive(Debug, Clone)]
pub struct StealthParams {
    pub receiver: SecretKey,
    pub ephemeral: EphemeralSecret,
}

impl Arbitrary for StealthParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (secret_key(), ephemeral_secret())
            .prop_map(|(receiver, ephemeral)| StealthParams {
                receiver,
                ephemeral,
            })
            .boxed()
    }
}

/// Derive the payment for a set of parameters.
pub fn payment_from_params(params: &StealthParams) -> StealthPayment {
    derive_stealth_address(&params.receiver.public_key(), &params.ephemeral)
        .expect("generated inputs are valid")
}
