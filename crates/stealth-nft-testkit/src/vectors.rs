//! Golden test vectors for deterministic verification.
//!
//! Each vector fixes a receiver key and an ephemeral secret and records the
//! public values, the stealth address, and the stealth private key they must
//! produce. Any other implementation of the derivation has to reproduce
//! these byte for byte.

use serde::Serialize;
use stealth_nft_core::{
    derive_stealth_address, recover_stealth_private_key, EphemeralSecret, SecretKey,
};

/// A golden test vector. Hex fields carry no `0x` prefix.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Receiver private key `d`.
    pub receiver_secret: &'static str,
    /// Sender ephemeral secret `r`.
    pub ephemeral_secret: &'static str,
    /// Expected receiver public key `P = d·G`.
    pub receiver_x: &'static str,
    pub receiver_y: &'static str,
    /// Expected checksummed address of `P`.
    pub receiver_address: &'static str,
    /// Expected ephemeral point `R = r·G`.
    pub ephemeral_x: &'static str,
    pub ephemeral_y: &'static str,
    /// Expected checksummed stealth address.
    pub stealth_address: &'static str,
    /// Expected stealth private key.
    pub stealth_private_key: &'static str,
}

const R_AAA_X: &str = "d9097785d1c4a347cc12d3d494f9420c82c4b154808bab17344559b1ceef0fff";
const R_AAA_Y: &str = "f67298ee48a0bb7593efb3c866c74c232e8b6e5ab31609dbed51295601a52182";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "generator receiver, secret 0xaaa",
            receiver_secret: "1",
            ephemeral_secret: "aaa",
            receiver_x: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            receiver_y: "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
            receiver_address: "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
            ephemeral_x: R_AAA_X,
            ephemeral_y: R_AAA_Y,
            stealth_address: "0x217c057201FD069A18104bF86dd67e023eE74A47",
            stealth_private_key: "3ba206e4413b47a1ca95d5b0e24e3bfebe3eb6b9c6af13dc6c8b01ab8ad4ae48",
        },
        GoldenVector {
            name: "receiver 2G, secret 0xaaa",
            receiver_secret: "2",
            ephemeral_secret: "aaa",
            receiver_x: "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
            receiver_y: "1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a",
            receiver_address: "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF",
            ephemeral_x: R_AAA_X,
            ephemeral_y: R_AAA_Y,
            stealth_address: "0xD5DF3A930419Bf84f91c041181a17cD1E51Cb2B1",
            stealth_private_key: "bc25eabc613ae12460d750358fbbc4ca1583a751e6770fc2509cdeca55c7518a",
        },
        GoldenVector {
            name: "full-width receiver key, secret 0xaaa",
            receiver_secret: "7a2f1c9e3b5d4a6f8e0c2b4a6d8f0e1c3b5a7d9f1e3c5b7a9d0f2e4c6b8a0d1f",
            ephemeral_secret: "aaa",
            receiver_x: "1e8520c00ac82c702d6134381c133eb5beb71645603c807778caa6ac87505887",
            receiver_y: "4771e3345aedd160c6f7a3dce46b893367bc497ae04909ac27cde11f34a74188",
            receiver_address: "0x454cd3593AA704c854C33C068a492aa81B40b152",
            ephemeral_x: R_AAA_X,
            ephemeral_y: R_AAA_Y,
            stealth_address: "0xaBeCBe6448E7A11CB3359255076D84c25E0d80da",
            stealth_private_key: "0771c8be78b48c3145917daab98f93ef064bc10b648a7fecd9f6275ee44742b7",
        },
        GoldenVector {
            name: "receiver n-1, secret 0x3",
            receiver_secret: "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140",
            ephemeral_secret: "3",
            receiver_x: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            receiver_y: "b7c52588d95c3b9aa25b0403f1eef75702e84bb7597aabe663b82f6f04ef2777",
            receiver_address: "0x80C0dbf239224071c59dD8970ab9d542E3414aB2",
            ephemeral_x: "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
            ephemeral_y: "388f7b0f632de8140fe337e62a37f3566500a99934c2231b6cb9fd7584b8e672",
            stealth_address: "0xFA9280d98E6f38D4bE508CeEF6F4358095550829",
            stealth_private_key: "583684e35e4a0dae56dfeaab9be03b52d7aa276907b681fbbe712ff592d92991",
        },
    ]
}

fn expect_eq(field: &str, actual: &str, expected: &str) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{field}: expected {expected}, got {actual}"))
    }
}

/// Recompute every value of `vector` and compare.
pub fn check_vector(vector: &GoldenVector) -> Result<(), String> {
    let receiver = SecretKey::from_hex(vector.receiver_secret).map_err(|e| e.to_string())?;
    let secret = EphemeralSecret::from_hex(vector.ephemeral_secret).map_err(|e| e.to_string())?;

    let public = receiver.public_key();
    expect_eq("receiver_x", &hex::encode(public.x), vector.receiver_x)?;
    expect_eq("receiver_y", &hex::encode(public.y), vector.receiver_y)?;
    expect_eq(
        "receiver_address",
        &receiver.address().to_checksum(),
        vector.receiver_address,
    )?;

    let payment = derive_stealth_address(&public, &secret).map_err(|e| e.to_string())?;
    expect_eq("ephemeral_x", &hex::encode(payment.ephemeral.x), vector.ephemeral_x)?;
    expect_eq("ephemeral_y", &hex::encode(payment.ephemeral.y), vector.ephemeral_y)?;
    expect_eq(
        "stealth_address",
        &payment.stealth_address.to_checksum(),
        vector.stealth_address,
    )?;

    let stealth_key =
        recover_stealth_private_key(&receiver, &payment.ephemeral).map_err(|e| e.to_string())?;
    expect_eq(
        "stealth_private_key",
        &hex::encode(stealth_key.to_be_bytes().as_slice()),
        vector.stealth_private_key,
    )?;
    expect_eq(
        "recovered address",
        &stealth_key.address().to_checksum(),
        vector.stealth_address,
    )
}

/// Verify all golden vectors.
///
/// Returns (name, passed, message) for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .into_iter()
        .map(|vector| match check_vector(&vector) {
            Ok(()) => (vector.name.to_string(), true, "ok".to_string()),
            Err(msg) => (vector.name.to_string(), false, msg),
        })
        .collect()
}

/// All vectors as pretty JSON, for sharing with other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
