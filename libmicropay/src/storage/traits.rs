use crate::host::HostState;

/// The flat byte-keyed store a host exposes to native contracts. Values are whatever the host keeps on disk,
/// envelope included; see [`crate::storage::Storage`] for the typed view.
pub trait StorageBackend {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn put(&mut self, key: &[u8], value: Vec<u8>);
    fn delete(&mut self, key: &[u8]);
}

/// Persists a whole in-memory host between process runs.
pub trait StateStore {
    fn write_state(&mut self, state: &HostState) -> Result<(), anyhow::Error>;
    fn load_state(&self) -> Result<HostState, anyhow::Error>;
}
