//! Cross-contract calls into the fungible asset contract.

use crate::address::Address;
use crate::error::MicropayError;
use crate::host::{ExternalCallError, Runtime};
use crate::impl_codec;
use log::*;
use serde::{Deserialize, Serialize};

pub const TRANSFER_METHOD: &str = "transfer";
/// The asset contract's success result.
pub const BYTE_TRUE: u8 = 0x01;

/// Arguments of the asset contract's `transfer` method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParam {
    pub from: Address,
    pub to: Address,
    pub value: u64,
}

impl_codec!(TransferParam { from, to, value });

/// Moves tokens by calling the fixed asset contract.
pub struct AssetBridge<'r, R: Runtime> {
    runtime: &'r mut R,
    asset_contract: Address,
}

impl<'r, R: Runtime> AssetBridge<'r, R> {
    pub fn new(runtime: &'r mut R, asset_contract: Address) -> Self {
        Self { runtime, asset_contract }
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: u64) -> Result<(), MicropayError> {
        debug!("Transferring {value} from {from} to {to}");
        let args = crate::codec::to_bytes(&TransferParam { from, to, value });
        let result = self.runtime.call_contract(&self.asset_contract, TRANSFER_METHOD, &args)?;
        if result.as_slice() != [BYTE_TRUE] {
            warn!("Asset contract refused transfer of {value} from {from} to {to}");
            return Err(ExternalCallError::UnexpectedResult(hex::encode(&result)).into());
        }
        Ok(())
    }
}
