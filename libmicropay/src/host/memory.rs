use crate::address::Address;
use crate::asset::{TransferParam, BYTE_TRUE, TRANSFER_METHOD};
use crate::codec::from_bytes;
use crate::config::EngineConfig;
use crate::crypto::SignatureScheme;
use crate::dispatcher::{invoke, Response};
use crate::host::{ExternalCallError, Runtime};
use crate::storage::MemoryBackend;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Token balances held by the in-memory asset contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: BTreeMap<Address, u64>,
}

impl TokenLedger {
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &BTreeMap<Address, u64> {
        &self.balances
    }

    /// Credits new tokens to `account`.
    pub fn mint(&mut self, account: Address, amount: u64) -> Result<(), ExternalCallError> {
        let balance = self.balance_of(&account);
        let updated = balance.checked_add(amount).ok_or(ExternalCallError::BalanceOverflow(account))?;
        self.balances.insert(account, updated);
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, value: u64) -> Result<(), ExternalCallError> {
        let from_balance = self.balance_of(from);
        if from_balance < value {
            return Err(ExternalCallError::InsufficientBalance {
                account: *from,
                balance: from_balance,
                requested: value,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance =
            self.balance_of(to).checked_add(value).ok_or(ExternalCallError::BalanceOverflow(*to))?;
        self.balances.insert(*from, from_balance - value);
        self.balances.insert(*to, to_balance);
        Ok(())
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|v| *v as u128).sum()
    }
}

/// Everything an in-memory host persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostState {
    pub block_height: u64,
    pub storage: MemoryBackend,
    pub ledger: TokenLedger,
}

/// A self-contained [`Runtime`]: key-value store, asset contract and block height in one process.
///
/// [`MemoryHost::execute`] runs one invocation and rolls back every write if it fails.
pub struct MemoryHost {
    state: HostState,
    config: EngineConfig,
    witnesses: BTreeSet<Address>,
}

impl MemoryHost {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_state(config, HostState::default())
    }

    pub fn with_state(config: EngineConfig, state: HostState) -> Self {
        Self { state, config, witnesses: BTreeSet::new() }
    }

    pub fn state(&self) -> &HostState {
        &self.state
    }

    pub fn into_state(self) -> HostState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_block_height(&mut self, height: u64) {
        self.state.block_height = height;
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.state.block_height = self.state.block_height.saturating_add(blocks);
    }

    /// Replaces the set of addresses that signed the next transaction.
    pub fn set_witnesses<I: IntoIterator<Item = Address>>(&mut self, witnesses: I) {
        self.witnesses = witnesses.into_iter().collect();
    }

    pub fn mint(&mut self, account: Address, amount: u64) -> Result<(), ExternalCallError> {
        self.state.ledger.mint(account, amount)
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.state.ledger.balance_of(account)
    }

    /// Runs `op` against the current state. On failure the state is restored to what it was before the call.
    pub fn execute<V: SignatureScheme>(&mut self, op: &str, input: &[u8]) -> Response {
        let snapshot = self.state.clone();
        let config = self.config.clone();
        let response = invoke::<Self, V>(self, &config, op, input);
        if let Some(err) = &response.error {
            warn!("{op} failed at height {}: {err}. Discarding its writes.", snapshot.block_height);
            self.state = snapshot;
        }
        response
    }
}

impl Runtime for MemoryHost {
    type Backend = MemoryBackend;

    fn block_height(&self) -> u64 {
        self.state.block_height
    }

    fn contract_address(&self) -> Address {
        self.config.contract_address
    }

    fn check_witness(&self, address: &Address) -> bool {
        self.witnesses.contains(address)
    }

    fn storage(&mut self) -> &mut MemoryBackend {
        &mut self.state.storage
    }

    fn call_contract(&mut self, contract: &Address, method: &str, args: &[u8]) -> Result<Vec<u8>, ExternalCallError> {
        if *contract != self.config.asset_contract {
            return Err(ExternalCallError::UnknownContract(*contract));
        }
        if method != TRANSFER_METHOD {
            return Err(ExternalCallError::UnknownMethod(method.to_string()));
        }
        let param: TransferParam = from_bytes(args).map_err(|e| ExternalCallError::BadArguments(e.to_string()))?;
        // The calling contract authorises spends of its own balance.
        if param.from != self.contract_address() && !self.witnesses.contains(&param.from) {
            return Err(ExternalCallError::Unauthorized(param.from));
        }
        self.state.ledger.transfer(&param.from, &param.to, param.value)?;
        Ok(vec![BYTE_TRUE])
    }
}
