//! Lock tree verification.
//!
//! A pending conditional transfer is a 48-byte leaf `expiration:u64LE ‖ amount:u64LE ‖ secret_hash`. The
//! locks root is built bottom-up: an odd layer duplicates its last node, equal siblings pass through
//! unchanged, and distinct siblings are hashed smallest first. Because of that ordering the root does not
//! depend on the order of the leaves.

use crate::amount::fail_safe_add;
use crate::codec::HASH_LEN;
use crate::error::MicropayError;
use crate::helpers::{sha256, sha256_concat, Hash256};
use crate::secret_registry::SecretLookup;
use log::*;

pub const LEAF_LEN: usize = 16 + HASH_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lock {
    pub expiration: u64,
    pub amount: u64,
    pub secret_hash: Hash256,
}

impl Lock {
    pub fn from_leaf(leaf: &[u8]) -> Result<Self, MicropayError> {
        if leaf.len() != LEAF_LEN {
            return Err(MicropayError::malformed(format!("a lock leaf is {LEAF_LEN} bytes, got {}", leaf.len())));
        }
        let mut expiration = [0u8; 8];
        let mut amount = [0u8; 8];
        let mut secret_hash = [0u8; HASH_LEN];
        expiration.copy_from_slice(&leaf[..8]);
        amount.copy_from_slice(&leaf[8..16]);
        secret_hash.copy_from_slice(&leaf[16..]);
        Ok(Self { expiration: u64::from_le_bytes(expiration), amount: u64::from_le_bytes(amount), secret_hash })
    }

    pub fn to_leaf(&self) -> [u8; LEAF_LEN] {
        let mut leaf = [0u8; LEAF_LEN];
        leaf[..8].copy_from_slice(&self.expiration.to_le_bytes());
        leaf[8..16].copy_from_slice(&self.amount.to_le_bytes());
        leaf[16..].copy_from_slice(&self.secret_hash);
        leaf
    }

    pub fn leaf_hash(&self) -> Hash256 {
        sha256(&self.to_leaf())
    }

    /// A lock pays out if its secret was revealed no later than its expiration block.
    pub fn is_claimable(&self, reveal_height: Option<u64>) -> bool {
        matches!(reveal_height, Some(h) if h > 0 && h <= self.expiration)
    }
}

/// Packs locks into the leaf vector the unlock operation expects.
pub fn pack_leaves(locks: &[Lock]) -> Vec<u8> {
    locks.iter().flat_map(|lock| lock.to_leaf()).collect()
}

fn parent(a: &Hash256, b: &Hash256) -> Hash256 {
    if a == b {
        *a
    } else if a < b {
        sha256_concat(&[a.as_slice(), b.as_slice()])
    } else {
        sha256_concat(&[b.as_slice(), a.as_slice()])
    }
}

/// Reduces leaf hashes to the locks root. Returns `None` for an empty tree.
pub fn compute_root(mut layer: Vec<Hash256>) -> Option<Hash256> {
    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            let last = layer[layer.len() - 1];
            layer.push(last);
        }
        layer = layer.chunks_exact(2).map(|pair| parent(&pair[0], &pair[1])).collect();
    }
    layer.first().copied()
}

/// Computes the locks root of a packed leaf vector and the total amount of its claimable locks.
pub fn root_and_unlocked_amount<L: SecretLookup + ?Sized>(
    leaves: &[u8],
    secrets: &L,
) -> Result<(Hash256, u64), MicropayError> {
    if leaves.is_empty() || leaves.len() % LEAF_LEN != 0 {
        return Err(MicropayError::malformed(format!(
            "merkle leaves must be a non-empty multiple of {LEAF_LEN} bytes, got {}",
            leaves.len()
        )));
    }
    let mut hashes = Vec::with_capacity(leaves.len() / LEAF_LEN);
    let mut unlocked = 0u64;
    for leaf in leaves.chunks_exact(LEAF_LEN) {
        let lock = Lock::from_leaf(leaf)?;
        let reveal_height = secrets.reveal_height(&lock.secret_hash)?;
        if lock.is_claimable(reveal_height) {
            unlocked = fail_safe_add(unlocked, lock.amount);
        } else {
            trace!("Lock on {} expiring at {} is not claimable", hex::encode(lock.secret_hash), lock.expiration);
        }
        hashes.push(lock.leaf_hash());
    }
    let root = compute_root(hashes).ok_or_else(|| MicropayError::malformed("empty lock tree"))?;
    Ok((root, unlocked))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::BTreeMap;

    struct Revealed(BTreeMap<Hash256, u64>);

    impl SecretLookup for Revealed {
        fn reveal_height(&self, secret_hash: &[u8]) -> Result<Option<u64>, MicropayError> {
            Ok(secret_hash.try_into().ok().and_then(|h: Hash256| self.0.get(&h).copied()))
        }
    }

    fn lock(expiration: u64, amount: u64, secret: &[u8]) -> Lock {
        Lock { expiration, amount, secret_hash: sha256(secret) }
    }

    #[test]
    fn leaf_layout() {
        let l = lock(200, 30, b"s");
        let leaf = l.to_leaf();
        assert_eq!(&leaf[..8], &200u64.to_le_bytes());
        assert_eq!(&leaf[8..16], &30u64.to_le_bytes());
        assert_eq!(Lock::from_leaf(&leaf).unwrap(), l);
        assert_eq!(Lock::from_leaf(&leaf[..47]).unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn single_leaf_root_is_its_hash() {
        let l = lock(200, 30, b"topsecret");
        let (root, amount) = root_and_unlocked_amount(&pack_leaves(&[l.clone()]), &Revealed(BTreeMap::new())).unwrap();
        assert_eq!(root, l.leaf_hash());
        assert_eq!(amount, 0);
    }

    #[test]
    fn root_is_order_independent() {
        let locks = vec![lock(10, 1, b"a"), lock(20, 2, b"b"), lock(30, 3, b"c"), lock(40, 4, b"d"), lock(50, 5, b"e")];
        let none = Revealed(BTreeMap::new());
        let (root, _) = root_and_unlocked_amount(&pack_leaves(&locks), &none).unwrap();
        let (again, _) = root_and_unlocked_amount(&pack_leaves(&locks), &none).unwrap();
        assert_eq!(root, again);
        let mut swapped = locks.clone();
        swapped.swap(0, 1);
        let (swapped_root, _) = root_and_unlocked_amount(&pack_leaves(&swapped), &none).unwrap();
        assert_eq!(root, swapped_root);
    }

    #[test]
    fn two_leaves_hash_smallest_first() {
        let (a, b) = (lock(1, 1, b"x").leaf_hash(), lock(2, 2, b"y").leaf_hash());
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        assert_eq!(compute_root(vec![a, b]), Some(sha256_concat(&[lo.as_slice(), hi.as_slice()])));
        assert_eq!(compute_root(vec![a, a]), Some(a));
        assert_eq!(compute_root(vec![]), None);
        // an odd layer duplicates its last node, which then passes through
        let c = lock(3, 3, b"z").leaf_hash();
        assert_eq!(compute_root(vec![a, b, c]), Some(parent(&parent(&a, &b), &c)));
    }

    #[test]
    fn only_timely_reveals_count() {
        let on_time = lock(200, 30, b"on time");
        let late = lock(200, 12, b"late");
        let at_expiry = lock(100, 5, b"at expiry");
        let never = lock(200, 7, b"never");
        let revealed = Revealed(BTreeMap::from([
            (on_time.secret_hash, 150),
            (late.secret_hash, 210),
            (at_expiry.secret_hash, 100),
        ]));
        let leaves = pack_leaves(&[on_time, late, at_expiry, never]);
        let (_, amount) = root_and_unlocked_amount(&leaves, &revealed).unwrap();
        assert_eq!(amount, 35);
    }

    #[test]
    fn rejects_ragged_leaves() {
        let none = Revealed(BTreeMap::new());
        assert_eq!(root_and_unlocked_amount(&[], &none).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(root_and_unlocked_amount(&[0u8; 50], &none).unwrap_err().kind(), ErrorKind::Malformed);
    }
}
