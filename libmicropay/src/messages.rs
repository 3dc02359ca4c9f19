//! Canonical digests of the signed off-chain messages.
//!
//! Every bundle is `prefix ‖ length_tag ‖ type_id:u64LE ‖ body`, hashed with SHA-256. The length tag is a
//! fixed ASCII literal per message type, shared with the off-chain clients, and is not recomputed from the
//! body. Integers in bodies are 8-byte little-endian, addresses are their 20 raw bytes and hashes/signatures
//! are written as given.

use crate::address::Address;
use crate::helpers::Hash256;
use sha2::{Digest, Sha256};

pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ontology Signed Message:\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    BalanceProof = 1,
    BalanceProofUpdate = 2,
    Withdraw = 3,
    CooperativeSettle = 4,
}

impl MessageType {
    pub fn type_id(self) -> u64 {
        self as u64
    }

    pub fn length_tag(self) -> &'static [u8] {
        match self {
            MessageType::BalanceProof => b"212",
            MessageType::BalanceProofUpdate => b"277",
            MessageType::Withdraw => b"168",
            MessageType::CooperativeSettle => b"220",
        }
    }
}

struct MessageBundle {
    hasher: Sha256,
}

impl MessageBundle {
    fn new(kind: MessageType) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(SIGNED_MESSAGE_PREFIX);
        hasher.update(kind.length_tag());
        hasher.update(kind.type_id().to_le_bytes());
        Self { hasher }
    }

    fn u64(mut self, value: u64) -> Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    fn bytes(mut self, value: &[u8]) -> Self {
        self.hasher.update(value);
        self
    }

    fn address(self, value: &Address) -> Self {
        self.bytes(value.as_bytes())
    }

    fn finish(self) -> Hash256 {
        self.hasher.finalize().into()
    }
}

/// The digest the partner signs for a closing balance proof.
pub fn balance_proof_digest(channel_id: u64, balance_hash: &[u8], nonce: u64, additional_hash: &[u8]) -> Hash256 {
    MessageBundle::new(MessageType::BalanceProof)
        .u64(channel_id)
        .bytes(balance_hash)
        .u64(nonce)
        .bytes(additional_hash)
        .finish()
}

/// The digest the non-closing participant signs when submitting the closer's balance proof.
pub fn balance_proof_update_digest(
    channel_id: u64,
    balance_hash: &[u8],
    nonce: u64,
    additional_hash: &[u8],
    close_signature: &[u8],
) -> Hash256 {
    MessageBundle::new(MessageType::BalanceProofUpdate)
        .u64(channel_id)
        .bytes(balance_hash)
        .u64(nonce)
        .bytes(additional_hash)
        .bytes(close_signature)
        .finish()
}

pub fn withdraw_digest(channel_id: u64, participant: &Address, total_withdraw: u64) -> Hash256 {
    MessageBundle::new(MessageType::Withdraw).u64(channel_id).address(participant).u64(total_withdraw).finish()
}

pub fn cooperative_settle_digest(
    channel_id: u64,
    participant1: &Address,
    participant1_balance: u64,
    participant2: &Address,
    participant2_balance: u64,
) -> Hash256 {
    MessageBundle::new(MessageType::CooperativeSettle)
        .u64(channel_id)
        .address(participant1)
        .u64(participant1_balance)
        .address(participant2)
        .u64(participant2_balance)
        .finish()
}

/// The balance hash a balance proof commits to: `sha256(transferred:u64LE ‖ locked:u64LE ‖ locks_root)`.
pub fn balance_hash(transferred: u64, locked: u64, locks_root: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(transferred.to_le_bytes());
    hasher.update(locked.to_le_bytes());
    hasher.update(locks_root);
    hasher.finalize().into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn withdraw_vector() {
        let digest = withdraw_digest(101, &Address::new([0x11; 20]), 30);
        assert_eq!(hex::encode(digest), "adb4b4ed380b2090c7b65e485a72da2227c6e5b49271d10ad648adda087fe160");
    }

    #[test]
    fn balance_proof_vector() {
        let bh = balance_hash(70, 0, &[]);
        assert_eq!(hex::encode(bh), "914e32aebfef22cb2aaec589ba06a77793a487f906275b5085aa78e2ef440b89");
        let digest = balance_proof_digest(101, &bh, 1, &[0u8; 32]);
        assert_eq!(hex::encode(digest), "f6dc8dbac3c738fb6dbf1d399b4d3acc2c0af6118f75523c3d537000c9596852");
    }

    #[test]
    fn domain_separation() {
        let bh = [7u8; 32];
        let ah = [9u8; 32];
        let close = balance_proof_digest(101, &bh, 3, &ah);
        let update_empty_sig = balance_proof_update_digest(101, &bh, 3, &ah, &[]);
        assert_ne!(close, update_empty_sig);
        let a = Address::new([1u8; 20]);
        let b = Address::new([2u8; 20]);
        let settle = cooperative_settle_digest(101, &a, 60, &b, 80);
        let swapped = cooperative_settle_digest(101, &b, 80, &a, 60);
        assert_ne!(settle, swapped);
        assert_ne!(withdraw_digest(101, &a, 60), withdraw_digest(102, &a, 60));
    }

    #[test]
    fn tags() {
        assert_eq!(MessageType::BalanceProof.type_id(), 1);
        assert_eq!(MessageType::CooperativeSettle.type_id(), 4);
        assert_eq!(MessageType::BalanceProofUpdate.length_tag(), b"277");
        assert_eq!(MessageType::Withdraw.length_tag(), b"168");
    }
}
