use crate::address::Address;
use crate::crypto::{SignatureError, SignatureScheme};
use crate::helpers::Hash256;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

/// Ed25519 over the raw 32-byte digest. Addresses are `sha256(pubkey)[..20]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    type PublicKey = VerifyingKey;
    type Signature = Signature;

    fn parse_public_key(bytes: &[u8]) -> Result<VerifyingKey, SignatureError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        VerifyingKey::from_bytes(&arr).map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))
    }

    fn parse_signature(bytes: &[u8]) -> Result<Signature, SignatureError> {
        Signature::from_slice(bytes).map_err(|e| SignatureError::InvalidSignature(e.to_string()))
    }

    fn verify(key: &VerifyingKey, digest: &Hash256, signature: &Signature) -> bool {
        key.verify_strict(digest, signature).is_ok()
    }

    fn address_of(key: &VerifyingKey) -> Address {
        Address::from_public_key(key.as_bytes())
    }
}

/// Signs a message digest. This is the off-chain half of [`Ed25519Scheme::verify`].
pub fn sign_digest(key: &SigningKey, digest: &Hash256) -> Vec<u8> {
    key.sign(digest).to_bytes().to_vec()
}
