//! What the engine needs from the blockchain it runs in.

mod memory;

pub use memory::{HostState, MemoryHost, TokenLedger};

use crate::address::Address;
use crate::storage::StorageBackend;
use thiserror::Error;

/// Capabilities of the host runtime during one invocation.
///
/// All calls are synchronous. If anything fails the host discards every write of the invocation, storage
/// and cross-contract effects alike.
pub trait Runtime {
    type Backend: StorageBackend;

    fn block_height(&self) -> u64;
    /// The address this contract runs under.
    fn contract_address(&self) -> Address;
    /// Whether `address` authorised the current transaction.
    fn check_witness(&self, address: &Address) -> bool;
    fn storage(&mut self) -> &mut Self::Backend;
    fn call_contract(&mut self, contract: &Address, method: &str, args: &[u8]) -> Result<Vec<u8>, ExternalCallError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExternalCallError {
    #[error("No contract at {0}")]
    UnknownContract(Address),
    #[error("Contract has no method '{0}'")]
    UnknownMethod(String),
    #[error("Transfer from {0} was not authorised")]
    Unauthorized(Address),
    #[error("{account} holds {balance}, cannot send {requested}")]
    InsufficientBalance { account: Address, balance: u64, requested: u64 },
    #[error("Balance of {0} would overflow")]
    BalanceOverflow(Address),
    #[error("Bad call arguments: {0}")]
    BadArguments(String),
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),
}
