use crate::error::CliError;
use libmicropay::host::HostState;
use libmicropay::{Address, EngineConfig};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The contents of `config.yml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Token balances of a freshly created ledger.
    #[serde(default)]
    pub genesis: BTreeMap<Address, u64>,
}

impl Settings {
    pub fn try_load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, CliError> {
        load_config_file(path)
    }

    /// Loads the settings, or falls back to the defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        match Self::try_load(Some(path.as_ref())) {
            Ok(settings) => Ok(settings),
            Err(CliError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration file at {}. Using defaults.", path.as_ref().display());
                Ok(Settings::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        save_config_file(path, self)
    }

    /// A new ledger at height 0 holding the genesis balances.
    pub fn genesis_state(&self) -> Result<HostState, CliError> {
        let mut state = HostState::default();
        for (account, amount) in &self.genesis {
            state.ledger.mint(*account, *amount).map_err(|e| CliError::InvalidArgument {
                field: "genesis",
                reason: e.to_string(),
            })?;
        }
        Ok(state)
    }
}

fn micropay_dir() -> PathBuf {
    let mut home = std::env::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(".micropay");
    home
}

pub fn default_config_path() -> PathBuf {
    micropay_dir().join("config.yml")
}

pub fn default_state_path() -> PathBuf {
    micropay_dir().join("state.ron")
}

pub fn load_config_file<P: AsRef<Path>>(path: Option<P>) -> Result<Settings, CliError> {
    let path = path.map(|p| p.as_ref().to_path_buf()).unwrap_or_else(default_config_path);
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let settings = serde_yml::from_reader(reader)?;
    Ok(settings)
}

pub fn save_config_file<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<(), CliError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_yml::to_writer(writer, settings)?;
    Ok(())
}
