use crate::address::Address;
use crate::crypto::SignatureError;
use crate::helpers::Hash256;

/// The signature primitives a host offers to native contracts.
///
/// Implementations never hash: `verify` receives the 32-byte digest produced by [`crate::messages`].
pub trait SignatureScheme {
    type PublicKey: Clone;
    type Signature;

    fn parse_public_key(bytes: &[u8]) -> Result<Self::PublicKey, SignatureError>;
    fn parse_signature(bytes: &[u8]) -> Result<Self::Signature, SignatureError>;
    fn verify(key: &Self::PublicKey, digest: &Hash256, signature: &Self::Signature) -> bool;
    /// The account address controlled by `key`.
    fn address_of(key: &Self::PublicKey) -> Address;
}
