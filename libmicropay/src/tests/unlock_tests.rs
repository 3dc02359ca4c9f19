//! Secret reveals and the unlocking of locks that were pending at settlement.

use super::harness::{Party, TestChain};
use crate::channel::params::*;
use crate::dispatcher::Operation;
use crate::error::ErrorKind;
use crate::events::EventKind;
use crate::helpers::sha256;
use crate::merkle::{pack_leaves, Lock};

const SECRET: &[u8; 32] = b"topsecret32bytespad.............";

fn register(chain: &mut TestChain, secret: &[u8]) -> crate::dispatcher::Response {
    chain.call(Operation::RegisterSecret, &RegisterSecretParam { secret: secret.to_vec() }, &[])
}

fn reveal_height(chain: &mut TestChain, secret: &[u8]) -> u64 {
    let param = SecretHashParam { secret_hash: sha256(secret).to_vec() };
    chain.call_ok(Operation::GetSecretRevealBlockHeight, &param, &[]).output_u64().expect("u64 output")
}

#[test]
fn register_secret_once() {
    let mut chain = TestChain::new();
    chain.set_height(150);
    let response = register(&mut chain, SECRET);
    assert!(response.is_true());
    let event = &response.events[0];
    assert_eq!(event.kind, EventKind::SecretRevealed);
    assert_eq!(event.get_u64("block_height"), Some(150));
    assert_eq!(reveal_height(&mut chain, SECRET), 150);

    chain.set_height(160);
    let response = register(&mut chain, SECRET);
    assert_eq!(response.output, vec![0x00]);
    assert_eq!(response.error.map(|e| e.kind()), Some(ErrorKind::State));
    assert_eq!(reveal_height(&mut chain, SECRET), 150);

    assert_eq!(reveal_height(&mut chain, b"never revealed"), 0);
    let bad_hash = SecretHashParam { secret_hash: vec![1; 31] };
    chain.call_err(Operation::GetSecretRevealBlockHeight, &bad_hash, &[], ErrorKind::Malformed);
    chain.call_err(Operation::RegisterSecret, &RegisterSecretParam { secret: vec![0; 32] }, &[], ErrorKind::Malformed);
    chain.call_err(Operation::RegisterSecret, &RegisterSecretParam { secret: vec![9; 33] }, &[], ErrorKind::Malformed);
}

#[test]
fn register_secret_batch() {
    let mut chain = TestChain::new();
    chain.set_height(20);
    let (s1, s2) = ([1u8; 32], [2u8; 32]);
    let secrets = [s1, s1, [0u8; 32], s2].concat();
    let response = chain.call(Operation::RegisterSecretBatch, &RegisterSecretBatchParam { secrets }, &[]);
    // partial success is not an error, and the registered secrets stay registered
    assert!(response.error.is_none());
    assert_eq!(response.output, vec![0x00]);
    assert_eq!(response.events.len(), 2);
    assert_eq!(reveal_height(&mut chain, &s1), 20);
    assert_eq!(reveal_height(&mut chain, &s2), 20);

    let s3 = [3u8; 32];
    let batch = RegisterSecretBatchParam { secrets: s3.to_vec() };
    let response = chain.call_ok(Operation::RegisterSecretBatch, &batch, &[]);
    assert!(response.is_true());

    let ragged = RegisterSecretBatchParam { secrets: vec![4; 40] };
    chain.call_err(Operation::RegisterSecretBatch, &ragged, &[], ErrorKind::Malformed);
    let empty = RegisterSecretBatchParam { secrets: vec![] };
    chain.call_err(Operation::RegisterSecretBatch, &empty, &[], ErrorKind::Malformed);
}

struct LockedChannel {
    chain: TestChain,
    a: Party,
    b: Party,
    id: u64,
    leaves: Vec<u8>,
}

/// A deposits 100 and has 30 locked towards B under a single lock expiring at block 200. B closes with A's
/// proof at block 100 and the channel is settled at block 180.
fn settle_with_pending_lock(reveal_at: Option<u64>) -> LockedChannel {
    let mut chain = TestChain::new();
    let (a, b) = (Party::from_seed(0x0a), Party::from_seed(0x0b));
    chain.fund(&a, 100);
    chain.set_height(90);
    let id = chain.open(&a, &b, 50);
    chain.deposit(id, &a, &b, 100);

    let lock = Lock { expiration: 200, amount: 30, secret_hash: sha256(SECRET) };
    let locks_root = lock.leaf_hash();
    let leaves = pack_leaves(&[lock]);
    let from_a = chain.proof(&a, id, 1, 0, 30, &locks_root);
    chain.set_height(100);
    chain.close(id, &b, &a, Some(&from_a));

    if let Some(height) = reveal_at.filter(|h| *h <= 180) {
        chain.set_height(height);
        assert!(register(&mut chain, SECRET).is_true());
    }

    chain.set_height(180);
    let settle = SettleChannelParam {
        channel_id: id,
        p1: a.address,
        p1_transferred: 0,
        p1_locked: 30,
        p1_locks_root: locks_root.to_vec(),
        p2: b.address,
        p2_transferred: 0,
        p2_locked: 0,
        p2_locks_root: vec![],
    };
    chain.call_ok(Operation::SettleChannel, &settle, &[b.address]);
    assert_eq!(chain.balance(&a.address), 70);
    assert_eq!(chain.balance(&b.address), 0);
    assert_eq!(chain.balance(&chain.contract()), 30);

    if let Some(height) = reveal_at.filter(|h| *h > 180) {
        chain.set_height(height);
        assert!(register(&mut chain, SECRET).is_true());
    }
    LockedChannel { chain, a, b, id, leaves }
}

impl LockedChannel {
    fn unlock_param(&self) -> UnlockParam {
        UnlockParam {
            channel_id: self.id,
            participant: self.b.address,
            partner: self.a.address,
            merkle_tree_leaves: self.leaves.clone(),
        }
    }
}

#[test]
fn unlock_revealed_lock() {
    let LockedChannel { mut chain, a, b, id, leaves } = settle_with_pending_lock(Some(150));
    chain.set_height(190);
    let param = UnlockParam { channel_id: id, participant: b.address, partner: a.address, merkle_tree_leaves: leaves };
    chain.call_err(Operation::Unlock, &param, &[a.address], ErrorKind::Auth);

    let response = chain.call_ok(Operation::Unlock, &param, &[b.address]);
    let event = &response.events[0];
    assert_eq!(event.kind, EventKind::ChannelUnlocked);
    assert_eq!(event.get_u64("unlocked_amount"), Some(30));
    assert_eq!(event.get_u64("returned_tokens"), Some(0));
    assert_eq!(chain.balance(&b.address), 30);
    assert_eq!(chain.balance(&a.address), 70);
    assert_eq!(chain.balance(&chain.contract()), 0);

    // unlock data is consumed
    chain.call_err(Operation::Unlock, &param, &[b.address], ErrorKind::NotFound);
}

#[test]
fn unlock_expired_lock_returns_funds() {
    let locked = settle_with_pending_lock(Some(210));
    let param = locked.unlock_param();
    let LockedChannel { mut chain, a, b, .. } = locked;
    chain.set_height(220);
    let response = chain.call_ok(Operation::Unlock, &param, &[b.address]);
    assert_eq!(response.events[0].get_u64("unlocked_amount"), Some(0));
    assert_eq!(response.events[0].get_u64("returned_tokens"), Some(30));
    assert_eq!(chain.balance(&a.address), 100);
    assert_eq!(chain.balance(&b.address), 0);
}

#[test]
fn unlock_preconditions() {
    let locked = settle_with_pending_lock(None);
    let param = locked.unlock_param();
    let LockedChannel { mut chain, a, b, id, .. } = locked;

    let mut ragged = param.clone();
    ragged.merkle_tree_leaves.push(0);
    chain.call_err(Operation::Unlock, &ragged, &[b.address], ErrorKind::Malformed);
    let mut empty = param.clone();
    empty.merkle_tree_leaves.clear();
    chain.call_err(Operation::Unlock, &empty, &[b.address], ErrorKind::Malformed);

    let other_lock = Lock { expiration: 200, amount: 30, secret_hash: sha256(b"another") };
    let mut wrong_leaves = param.clone();
    wrong_leaves.merkle_tree_leaves = pack_leaves(&[other_lock]);
    chain.call_err(Operation::Unlock, &wrong_leaves, &[b.address], ErrorKind::State);

    // the roles are directional: A has nothing to claim from B
    let reversed = UnlockParam { participant: a.address, partner: b.address, ..param.clone() };
    chain.call_err(Operation::Unlock, &reversed, &[a.address], ErrorKind::NotFound);

    // a new channel between the pair takes a fresh id, so the old one can still be unlocked
    let id2 = chain.open(&a, &b, 10);
    assert_ne!(id2, id);
    let response = chain.call_ok(Operation::Unlock, &param, &[b.address]);
    assert_eq!(response.events[0].get_u64("returned_tokens"), Some(30));
    assert_eq!(chain.balance(&a.address), 100);
}

#[test]
fn unlock_before_settlement_is_rejected() {
    let mut chain = TestChain::new();
    let (a, b) = (Party::from_seed(0x0a), Party::from_seed(0x0b));
    let id = chain.open(&a, &b, 50);
    let lock = Lock { expiration: 200, amount: 30, secret_hash: sha256(SECRET) };
    let param = UnlockParam {
        channel_id: id,
        participant: b.address,
        partner: a.address,
        merkle_tree_leaves: pack_leaves(&[lock]),
    };
    chain.call_err(Operation::Unlock, &param, &[b.address], ErrorKind::State);
}
