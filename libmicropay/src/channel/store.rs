//! Storage layout of channel records, the participant-pair index, unlock data and cached public keys.

use crate::address::Address;
use crate::amount::checked_add;
use crate::channel::data_objects::{ChannelInfo, UnlockDataInfo};
use crate::codec::to_bytes;
use crate::error::MicropayError;
use crate::helpers::{sha256_concat, Hash256};
use crate::storage::{Storage, StorageBackend};
use log::*;

pub const CHANNEL_COUNTER_KEY: &[u8] = b"channelCounter";
/// The counter's value before any channel is opened. The first channel gets the next id.
pub const INITIAL_CHANNEL_COUNTER: u64 = 100;

pub fn channel_key(channel_id: u64) -> Vec<u8> {
    to_bytes(&channel_id)
}

/// Key of the unordered pair `{a, b}`.
pub fn pair_key(a: &Address, b: &Address) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    sha256_concat(&[lo.as_ref(), hi.as_ref()])
}

pub fn unlock_key(channel_id: u64, participant: &Address, partner: &Address) -> Hash256 {
    sha256_concat(&[channel_id.to_le_bytes().as_slice(), participant.as_ref(), partner.as_ref()])
}

pub fn pubkey_key(contract: &Address, wallet: &Address) -> Vec<u8> {
    let mut key = contract.as_bytes().to_vec();
    key.extend_from_slice(wallet.as_bytes());
    key
}

pub struct ChannelStore<'a, B: StorageBackend + ?Sized> {
    storage: Storage<'a, B>,
}

impl<'a, B: StorageBackend + ?Sized> ChannelStore<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { storage: Storage::new(backend) }
    }

    pub fn channel_counter(&self) -> Result<u64, MicropayError> {
        Ok(self.storage.get_record::<u64>(CHANNEL_COUNTER_KEY)?.unwrap_or(INITIAL_CHANNEL_COUNTER))
    }

    /// Allocates the next channel id and persists the counter.
    pub fn next_channel_id(&mut self) -> Result<u64, MicropayError> {
        let id = checked_add(self.channel_counter()?, 1, "channel counter")?;
        self.storage.put_record(CHANNEL_COUNTER_KEY, &id);
        Ok(id)
    }

    pub fn get_channel(&self, channel_id: u64) -> Result<Option<ChannelInfo>, MicropayError> {
        self.storage.get_record(&channel_key(channel_id))
    }

    pub fn put_channel(&mut self, channel: &ChannelInfo) {
        trace!("Storing channel {} in state {}", channel.channel_id, channel.state);
        self.storage.put_record(&channel_key(channel.channel_id), channel);
    }

    pub fn delete_channel(&mut self, channel_id: u64) {
        debug!("Deleting channel record {channel_id}");
        self.storage.delete(&channel_key(channel_id));
    }

    /// The live channel between `a` and `b`, or 0 if there is none.
    pub fn get_channel_id(&self, a: &Address, b: &Address) -> Result<u64, MicropayError> {
        Ok(self.storage.get_record::<u64>(&pair_key(a, b))?.unwrap_or(0))
    }

    pub fn put_channel_id(&mut self, a: &Address, b: &Address, channel_id: u64) {
        self.storage.put_record(&pair_key(a, b), &channel_id);
    }

    pub fn delete_channel_id(&mut self, a: &Address, b: &Address) {
        debug!("Clearing pair index of {a} and {b}");
        self.storage.delete(&pair_key(a, b));
    }

    pub fn get_unlock_data(
        &self,
        channel_id: u64,
        participant: &Address,
        partner: &Address,
    ) -> Result<Option<UnlockDataInfo>, MicropayError> {
        self.storage.get_record(&unlock_key(channel_id, participant, partner))
    }

    pub fn put_unlock_data(
        &mut self,
        channel_id: u64,
        participant: &Address,
        partner: &Address,
        data: &UnlockDataInfo,
    ) {
        self.storage.put_record(&unlock_key(channel_id, participant, partner), data);
    }

    pub fn delete_unlock_data(&mut self, channel_id: u64, participant: &Address, partner: &Address) {
        self.storage.delete(&unlock_key(channel_id, participant, partner));
    }

    pub fn get_pubkey(&self, contract: &Address, wallet: &Address) -> Result<Option<Vec<u8>>, MicropayError> {
        self.storage.get(&pubkey_key(contract, wallet))
    }

    pub fn put_pubkey(&mut self, contract: &Address, wallet: &Address, pubkey: &[u8]) {
        self.storage.put(&pubkey_key(contract, wallet), pubkey);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::helpers::sha256;
    use crate::storage::MemoryBackend;

    #[test]
    fn counter_starts_at_100() {
        let mut backend = MemoryBackend::new();
        let mut store = ChannelStore::new(&mut backend);
        assert_eq!(store.channel_counter().unwrap(), 100);
        assert_eq!(store.next_channel_id().unwrap(), 101);
        assert_eq!(store.next_channel_id().unwrap(), 102);
        assert_eq!(store.channel_counter().unwrap(), 102);
    }

    #[test]
    fn pair_index_is_unordered() {
        let (a, b) = (Address::new([1; 20]), Address::new([2; 20]));
        assert_eq!(pair_key(&a, &b), pair_key(&b, &a));
        let mut joined = a.as_bytes().to_vec();
        joined.extend_from_slice(b.as_bytes());
        assert_eq!(pair_key(&b, &a), sha256(&joined));

        let mut backend = MemoryBackend::new();
        let mut store = ChannelStore::new(&mut backend);
        assert_eq!(store.get_channel_id(&a, &b).unwrap(), 0);
        store.put_channel_id(&b, &a, 101);
        assert_eq!(store.get_channel_id(&a, &b).unwrap(), 101);
        store.delete_channel_id(&a, &b);
        assert_eq!(store.get_channel_id(&b, &a).unwrap(), 0);
    }

    #[test]
    fn key_layouts() {
        assert_eq!(channel_key(101), vec![0x01, 0x65]);
        let (a, b) = (Address::new([1; 20]), Address::new([2; 20]));
        assert_eq!(pubkey_key(&a, &b).len(), 40);
        assert_ne!(unlock_key(101, &a, &b), unlock_key(101, &b, &a));
    }

    #[test]
    fn channel_and_unlock_records() {
        let (a, b) = (Address::new([1; 20]), Address::new([2; 20]));
        let mut backend = MemoryBackend::new();
        let mut store = ChannelStore::new(&mut backend);
        let channel = ChannelInfo::open(101, a, b, 50);
        store.put_channel(&channel);
        assert_eq!(store.get_channel(101).unwrap(), Some(channel));
        store.delete_channel(101);
        assert_eq!(store.get_channel(101).unwrap(), None);

        let data = UnlockDataInfo { locks_root: vec![3; 32], locked_amount: 30 };
        store.put_unlock_data(101, &a, &b, &data);
        assert_eq!(store.get_unlock_data(101, &a, &b).unwrap(), Some(data));
        assert_eq!(store.get_unlock_data(101, &b, &a).unwrap(), None);
        store.delete_unlock_data(101, &a, &b);
        assert_eq!(store.get_unlock_data(101, &a, &b).unwrap(), None);
    }
}
