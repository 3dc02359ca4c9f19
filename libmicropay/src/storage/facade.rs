use crate::codec::{from_bytes, to_bytes, ByteSink, ByteSource, CodecError, Decodable, Encodable};
use crate::error::MicropayError;
use crate::storage::traits::StorageBackend;

pub const STATE_VERSION: u8 = 0;

/// The host's on-disk envelope around every stored value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageItem {
    pub state_version: u8,
    pub value: Vec<u8>,
}

impl StorageItem {
    pub fn new(value: Vec<u8>) -> Self {
        Self { state_version: STATE_VERSION, value }
    }
}

impl Encodable for StorageItem {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_u8(self.state_version);
        sink.write_var_bytes(&self.value);
    }
}

impl Decodable for StorageItem {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        let state_version = source.read_u8()?;
        let value = source.read_var_bytes()?;
        Ok(Self { state_version, value })
    }
}

/// Typed get/put/delete over a [`StorageBackend`]. Values are wrapped in a [`StorageItem`] on the way in and
/// unwrapped on the way out.
pub struct Storage<'a, B: StorageBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: StorageBackend + ?Sized> Storage<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MicropayError> {
        match self.backend.get(key) {
            None => Ok(None),
            Some(raw) => {
                let item = from_bytes::<StorageItem>(&raw)
                    .map_err(|e| MicropayError::malformed(format!("corrupt storage envelope: {e}")))?;
                Ok(Some(item.value))
            }
        }
    }

    pub fn get_record<T: Decodable>(&self, key: &[u8]) -> Result<Option<T>, MicropayError> {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => Ok(Some(from_bytes::<T>(&value)?)),
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        let item = StorageItem::new(value.to_vec());
        self.backend.put(key, to_bytes(&item));
    }

    pub fn put_record<T: Encodable + ?Sized>(&mut self, key: &[u8], record: &T) {
        self.put(key, &to_bytes(record));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.backend.delete(key);
    }
}
