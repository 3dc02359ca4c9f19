use crate::host::HostState;
use crate::storage::traits::StateStore;
use ron::ser::PrettyConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// A file-based store for the state of an in-memory host.
///
/// The whole state (block height, key-value store and token ledger) is kept in a single RON file, e.g.
/// `~/.micropay/state.ron`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a new file store backed by the file at `path`. Missing parent directories are created.
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// Returns the path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl StateStore for FileStore {
    fn write_state(&mut self, state: &HostState) -> Result<(), anyhow::Error> {
        let config = PrettyConfig::new().compact_arrays(true).compact_maps(false);
        let val = ron::ser::to_string_pretty(state, config)?;
        fs::write(&self.path, val)?;
        Ok(())
    }

    fn load_state(&self) -> Result<HostState, anyhow::Error> {
        let val = fs::read_to_string(&self.path)?;
        let state: HostState = ron::de::from_str(&val)?;
        Ok(state)
    }
}
