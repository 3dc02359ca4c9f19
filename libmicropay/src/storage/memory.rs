use crate::storage::traits::StorageBackend;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered in-memory [`StorageBackend`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBackend {
    #[serde(with = "crate::helpers::hex_map")]
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) {
        trace!("put {} ({} bytes)", hex::encode(key), value.len());
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        trace!("delete {}", hex::encode(key));
        self.entries.remove(key);
    }
}
