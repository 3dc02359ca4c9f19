use crate::address::{Address, ADDRESS_LEN};
use serde::{Deserialize, Serialize};

const fn native_address(last: u8) -> Address {
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes[ADDRESS_LEN - 1] = last;
    Address::new(bytes)
}

/// Well-known address of the fungible asset contract channels are denominated in.
pub const DEFAULT_ASSET_CONTRACT: Address = native_address(0x01);
/// Well-known address the engine itself runs under.
pub const DEFAULT_CONTRACT_ADDRESS: Address = native_address(0x0a);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The address an in-memory host runs the engine under. The engine itself asks the runtime.
    #[serde(default = "default_contract_address")]
    pub contract_address: Address,
    /// The external contract whose `transfer` method moves funds.
    #[serde(default = "default_asset_contract")]
    pub asset_contract: Address,
}

fn default_contract_address() -> Address {
    DEFAULT_CONTRACT_ADDRESS
}

fn default_asset_contract() -> Address {
    DEFAULT_ASSET_CONTRACT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { contract_address: DEFAULT_CONTRACT_ADDRESS, asset_contract: DEFAULT_ASSET_CONTRACT }
    }
}
