mod facade;
pub mod file_store;
mod memory;
pub mod traits;

pub use facade::{Storage, StorageItem, STATE_VERSION};
pub use file_store::FileStore;
pub use memory::MemoryBackend;
pub use traits::{StateStore, StorageBackend};
