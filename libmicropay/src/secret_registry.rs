//! On-chain record of revealed hash-lock secrets.
//!
//! Each entry maps `sha256(secret)` to the block height at which the secret was published. Entries are
//! write-once.

use crate::codec::HASH_LEN;
use crate::error::MicropayError;
use crate::helpers::{sha256, Hash256};
use crate::storage::{Storage, StorageBackend};
use log::*;

pub const SECRET_LEN: usize = 32;

/// Read access to reveal heights, as needed by the merkle verifier.
pub trait SecretLookup {
    /// The height at which the pre-image of `secret_hash` was revealed, or `None` if it never was.
    fn reveal_height(&self, secret_hash: &[u8]) -> Result<Option<u64>, MicropayError>;
}

pub struct SecretRegistry<'a, B: StorageBackend + ?Sized> {
    storage: Storage<'a, B>,
}

impl<'a, B: StorageBackend + ?Sized> SecretRegistry<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { storage: Storage::new(backend) }
    }

    /// Records that `secret` was revealed at `block_height` and returns its hash.
    pub fn register(&mut self, secret: &[u8], block_height: u64) -> Result<Hash256, MicropayError> {
        if secret.len() != SECRET_LEN {
            return Err(MicropayError::malformed(format!("secret must be {SECRET_LEN} bytes, got {}", secret.len())));
        }
        if secret.iter().all(|b| *b == 0) {
            return Err(MicropayError::malformed("the all-zero secret cannot be registered"));
        }
        let secret_hash = sha256(secret);
        if let Some(height) = self.reveal_height(&secret_hash)? {
            warn!("Secret with hash {} was already revealed at block {height}", hex::encode(secret_hash));
            return Err(MicropayError::state(format!("secret already registered at block {height}")));
        }
        self.storage.put_record(&secret_hash, &block_height);
        debug!("Secret with hash {} revealed at block {block_height}", hex::encode(secret_hash));
        Ok(secret_hash)
    }
}

impl<B: StorageBackend + ?Sized> SecretLookup for SecretRegistry<'_, B> {
    fn reveal_height(&self, secret_hash: &[u8]) -> Result<Option<u64>, MicropayError> {
        if secret_hash.len() != HASH_LEN {
            return Err(MicropayError::malformed(format!("secret hash must be {HASH_LEN} bytes")));
        }
        self.storage.get_record::<u64>(secret_hash)
    }
}
