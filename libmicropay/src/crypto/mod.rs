mod ed25519;
mod traits;

pub use ed25519::{sign_digest, Ed25519Scheme};
pub use traits::SignatureScheme;

use crate::address::Address;
use crate::helpers::Hash256;
use log::*;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),
    #[error("Public key belongs to {actual}, not {expected}")]
    SignerMismatch { expected: Address, actual: Address },
    #[error("Signature by {0} does not verify")]
    VerificationFailed(Address),
}

/// Checks that `signature` over `digest` was made with `pubkey`, and that `pubkey` controls `signer`.
pub fn verify_signer<V: SignatureScheme>(
    signer: &Address,
    pubkey: &[u8],
    signature: &[u8],
    digest: &Hash256,
) -> Result<(), SignatureError> {
    let key = V::parse_public_key(pubkey)?;
    let actual = V::address_of(&key);
    if actual != *signer {
        warn!("Public key {} does not derive to {signer}", hex::encode(pubkey));
        return Err(SignatureError::SignerMismatch { expected: *signer, actual });
    }
    let sig = V::parse_signature(signature)?;
    if !V::verify(&key, digest, &sig) {
        warn!("Signature from {signer} over {} rejected", hex::encode(digest));
        return Err(SignatureError::VerificationFailed(*signer));
    }
    Ok(())
}
