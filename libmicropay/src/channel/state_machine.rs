use crate::address::Address;
use crate::amount::{checked_add, checked_sub, positive_sub};
use crate::asset::AssetBridge;
use crate::channel::data_objects::{ChannelInfo, ChannelState, Side, UnlockDataInfo};
use crate::channel::params::*;
use crate::channel::settlement::{needs_swap, settle_amounts, SettlementInput};
use crate::channel::store::ChannelStore;
use crate::codec::HASH_LEN;
use crate::config::EngineConfig;
use crate::crypto::{verify_signer, SignatureError, SignatureScheme};
use crate::error::MicropayError;
use crate::events::{ContractEvent, EventKind};
use crate::helpers::Hash256;
use crate::host::Runtime;
use crate::merkle;
use crate::messages;
use crate::secret_registry::{SecretRegistry, SECRET_LEN};
use log::*;
use std::marker::PhantomData;

/// Executes channel operations against a host runtime.
///
/// One engine serves one invocation. Every method either completes all of its writes and transfers or
/// returns an error, in which case the host is expected to discard whatever was written. Events are
/// collected in order and handed back by [`ChannelEngine::into_events`].
pub struct ChannelEngine<'r, R: Runtime, V: SignatureScheme> {
    pub(super) runtime: &'r mut R,
    pub(super) config: &'r EngineConfig,
    events: Vec<ContractEvent>,
    _scheme: PhantomData<V>,
}

impl<'r, R: Runtime, V: SignatureScheme> ChannelEngine<'r, R, V> {
    pub fn new(runtime: &'r mut R, config: &'r EngineConfig) -> Self {
        Self { runtime, config, events: Vec::new(), _scheme: PhantomData }
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ContractEvent> {
        self.events
    }

    pub(super) fn store(&mut self) -> ChannelStore<'_, R::Backend> {
        ChannelStore::new(self.runtime.storage())
    }

    fn event(&self, kind: EventKind) -> ContractEvent {
        ContractEvent::new(self.runtime.contract_address(), kind)
    }

    fn emit(&mut self, event: ContractEvent) {
        trace!("Emitting {} for {} participant(s)", event.kind, event.participants.len());
        self.events.push(event);
    }

    fn require_witness(&self, address: &Address) -> Result<(), MicropayError> {
        if self.runtime.check_witness(address) {
            Ok(())
        } else {
            warn!("{address} did not authorise this transaction");
            Err(MicropayError::Auth(format!("{address} must sign the transaction")))
        }
    }

    fn require_either_witness(&self, a: &Address, b: &Address) -> Result<(), MicropayError> {
        if self.runtime.check_witness(a) || self.runtime.check_witness(b) {
            Ok(())
        } else {
            Err(MicropayError::Auth(format!("{a} or {b} must sign the transaction")))
        }
    }

    fn verify(&self, signer: &Address, pubkey: &[u8], signature: &[u8], digest: &Hash256) -> Result<(), MicropayError> {
        verify_signer::<V>(signer, pubkey, signature, digest)?;
        Ok(())
    }

    /// Pays `value` out of the contract's balance. Zero amounts are not sent.
    fn pay_out(&mut self, to: Address, value: u64) -> Result<(), MicropayError> {
        if value == 0 {
            return Ok(());
        }
        let contract = self.runtime.contract_address();
        AssetBridge::new(&mut *self.runtime, self.config.asset_contract).transfer(contract, to, value)
    }

    fn pay_in(&mut self, from: Address, value: u64) -> Result<(), MicropayError> {
        let contract = self.runtime.contract_address();
        AssetBridge::new(&mut *self.runtime, self.config.asset_contract).transfer(from, contract, value)
    }

    /// Loads a channel, resolves both sides and checks that it is still the live channel of the pair.
    fn load_live_channel(
        &mut self,
        channel_id: u64,
        participant: &Address,
        partner: &Address,
    ) -> Result<(ChannelInfo, Side, Side), MicropayError> {
        let store = self.store();
        let channel =
            store.get_channel(channel_id)?.ok_or_else(|| MicropayError::not_found(format!("channel {channel_id}")))?;
        let (me, other) = channel.sides_for(participant, partner)?;
        let indexed = store.get_channel_id(participant, partner)?;
        if indexed != channel_id {
            return Err(MicropayError::state(format!(
                "channel {channel_id} is not the live channel of its participants (index holds {indexed})"
            )));
        }
        Ok((channel, me, other))
    }

    fn require_state(channel: &ChannelInfo, expected: ChannelState) -> Result<(), MicropayError> {
        if channel.state != expected {
            warn!("Channel {} is {}, expected {expected}", channel.channel_id, channel.state);
            return Err(MicropayError::state(format!(
                "channel {} is {}, expected {expected}",
                channel.channel_id, channel.state
            )));
        }
        Ok(())
    }

    fn require_hash(value: &[u8], what: &str) -> Result<(), MicropayError> {
        if value.len() != HASH_LEN {
            return Err(MicropayError::malformed(format!("{what} must be {HASH_LEN} bytes, got {}", value.len())));
        }
        Ok(())
    }

    pub fn open_channel(&mut self, param: &OpenChannelParam) -> Result<u64, MicropayError> {
        debug!("OpenChannel {} <-> {}, timeout {}", param.p1_wallet, param.p2_wallet, param.settle_timeout);
        self.require_witness(&param.p1_wallet)?;
        if param.p1_wallet == param.p2_wallet {
            return Err(MicropayError::state("a channel needs two distinct participants"));
        }
        if param.settle_timeout == 0 {
            return Err(MicropayError::math("settle timeout must be greater than zero"));
        }
        if !param.p1_pubkey.is_empty() {
            let key = V::parse_public_key(&param.p1_pubkey)?;
            let actual = V::address_of(&key);
            if actual != param.p1_wallet {
                return Err(SignatureError::SignerMismatch { expected: param.p1_wallet, actual }.into());
            }
        }
        let contract = self.runtime.contract_address();
        let mut store = self.store();
        let existing = store.get_channel_id(&param.p1_wallet, &param.p2_wallet)?;
        if existing != 0 {
            return Err(MicropayError::state(format!("channel {existing} between these participants is still live")));
        }
        if !param.p1_pubkey.is_empty() {
            store.put_pubkey(&contract, &param.p1_wallet, &param.p1_pubkey);
        }
        let channel_id = store.next_channel_id()?;
        let channel = ChannelInfo::open(channel_id, param.p1_wallet, param.p2_wallet, param.settle_timeout);
        store.put_channel(&channel);
        store.put_channel_id(&param.p1_wallet, &param.p2_wallet, channel_id);
        info!("Opened channel {channel_id} between {} and {}", param.p1_wallet, param.p2_wallet);
        let event = self
            .event(EventKind::ChannelOpened)
            .participant(param.p1_wallet)
            .participant(param.p2_wallet)
            .with("channel_identifier", channel_id)
            .with("participant1", param.p1_wallet)
            .with("participant2", param.p2_wallet)
            .with("settle_timeout", param.settle_timeout);
        self.emit(event);
        Ok(channel_id)
    }

    pub fn set_total_deposit(&mut self, param: &SetTotalDepositParam) -> Result<(), MicropayError> {
        debug!("SetTotalDeposit {} on channel {} to {}", param.participant, param.channel_id, param.set_total_deposit);
        self.require_witness(&param.participant)?;
        let (mut channel, me, _) = self.load_live_channel(param.channel_id, &param.participant, &param.partner)?;
        Self::require_state(&channel, ChannelState::Opened)?;
        if param.set_total_deposit == 0 {
            return Err(MicropayError::math("total deposit must be greater than zero"));
        }
        let added = positive_sub(param.set_total_deposit, channel.participant(me).deposit, "deposit increase")?;
        channel.participant_mut(me).deposit = param.set_total_deposit;
        channel.total_deposit()?;
        self.pay_in(param.participant, added)?;
        self.store().put_channel(&channel);
        let event = self
            .event(EventKind::SetTotalDeposit)
            .participant(param.participant)
            .with("channel_identifier", param.channel_id)
            .with("participant", param.participant)
            .with("total_deposit", param.set_total_deposit);
        self.emit(event);
        Ok(())
    }

    pub fn set_total_withdraw(&mut self, param: &SetTotalWithdrawParam) -> Result<(), MicropayError> {
        debug!("SetTotalWithdraw {} on channel {} to {}", param.participant, param.channel_id, param.total_withdraw);
        self.require_witness(&param.participant)?;
        let (mut channel, me, _) = self.load_live_channel(param.channel_id, &param.participant, &param.partner)?;
        Self::require_state(&channel, ChannelState::Opened)?;
        if param.total_withdraw == 0 {
            return Err(MicropayError::math("total withdraw must be greater than zero"));
        }
        let current = positive_sub(param.total_withdraw, channel.participant(me).withdraw_amount, "withdraw increase")?;
        if param.total_withdraw > channel.participant(me).deposit {
            return Err(MicropayError::math(format!(
                "total withdraw {} exceeds the deposit of {}",
                param.total_withdraw,
                channel.participant(me).deposit
            )));
        }
        if channel.participant1.nonce != 0 || channel.participant2.nonce != 0 {
            return Err(MicropayError::state("withdrawals are not allowed once a balance proof was submitted"));
        }
        let digest = messages::withdraw_digest(param.channel_id, &param.participant, param.total_withdraw);
        self.verify(&param.participant, &param.participant_pubkey, &param.participant_sig, &digest)?;
        self.verify(&param.partner, &param.partner_pubkey, &param.partner_sig, &digest)?;
        channel.participant_mut(me).withdraw_amount = param.total_withdraw;
        channel.available_deposit()?;
        self.pay_out(param.participant, current)?;
        self.store().put_channel(&channel);
        let event = self
            .event(EventKind::SetTotalWithdraw)
            .participant(param.participant)
            .with("channel_identifier", param.channel_id)
            .with("participant", param.participant)
            .with("total_withdraw", param.total_withdraw);
        self.emit(event);
        Ok(())
    }

    pub fn close_channel(&mut self, param: &CloseChannelParam) -> Result<(), MicropayError> {
        debug!("CloseChannel {} by {}", param.channel_id, param.closer);
        self.require_witness(&param.closer)?;
        let (mut channel, me, other) = self.load_live_channel(param.channel_id, &param.closer, &param.partner)?;
        Self::require_state(&channel, ChannelState::Opened)?;
        let height = self.runtime.block_height();
        let deadline = checked_add(height, channel.settle_block_height, "settlement deadline")?;
        channel.state = ChannelState::Closed;
        channel.settle_block_height = deadline;
        channel.participant_mut(me).is_closer = true;
        if param.nonce > 0 {
            Self::require_hash(&param.balance_hash, "balance hash")?;
            Self::require_hash(&param.additional_hash, "additional hash")?;
            let digest = messages::balance_proof_digest(
                param.channel_id,
                &param.balance_hash,
                param.nonce,
                &param.additional_hash,
            );
            self.verify(&param.partner, &param.partner_pubkey, &param.partner_sig, &digest)?;
            channel.participant_mut(other).update_balance_proof(param.nonce, &param.balance_hash)?;
        }
        self.store().put_channel(&channel);
        info!("Channel {} closed by {}, settleable after block {deadline}", param.channel_id, param.closer);
        let event = self
            .event(EventKind::ChannelClose)
            .participant(param.closer)
            .participant(param.partner)
            .with("channel_identifier", param.channel_id)
            .with("closing_participant", param.closer)
            .with("nonce", param.nonce)
            .with("balance_hash", param.balance_hash.clone());
        self.emit(event);
        Ok(())
    }

    pub fn update_non_closing_balance_proof(&mut self, param: &UpdateNonCloseParam) -> Result<(), MicropayError> {
        debug!("UpdateNonClosingBalanceProof on channel {} by {}", param.channel_id, param.non_close_participant);
        self.require_witness(&param.non_close_participant)?;
        let (mut channel, _, closer) =
            self.load_live_channel(param.channel_id, &param.non_close_participant, &param.close_participant)?;
        Self::require_state(&channel, ChannelState::Closed)?;
        let height = self.runtime.block_height();
        if height > channel.settle_block_height {
            return Err(MicropayError::state(format!(
                "the update period of channel {} ended at block {}",
                param.channel_id, channel.settle_block_height
            )));
        }
        if param.nonce == 0 {
            return Err(MicropayError::math("nonce must be greater than zero"));
        }
        if !channel.participant(closer).is_closer {
            return Err(MicropayError::state(format!("{} did not close the channel", param.close_participant)));
        }
        Self::require_hash(&param.balance_hash, "balance hash")?;
        Self::require_hash(&param.additional_hash, "additional hash")?;
        let update_digest = messages::balance_proof_update_digest(
            param.channel_id,
            &param.balance_hash,
            param.nonce,
            &param.additional_hash,
            &param.close_signature,
        );
        self.verify(&param.non_close_participant, &param.non_close_pubkey, &param.non_close_signature, &update_digest)?;
        let proof_digest =
            messages::balance_proof_digest(param.channel_id, &param.balance_hash, param.nonce, &param.additional_hash);
        self.verify(&param.close_participant, &param.close_pubkey, &param.close_signature, &proof_digest)?;
        channel.participant_mut(closer).update_balance_proof(param.nonce, &param.balance_hash)?;
        self.store().put_channel(&channel);
        let event = self
            .event(EventKind::NonClosingBPFUpdate)
            .participant(param.close_participant)
            .participant(param.non_close_participant)
            .with("channel_identifier", param.channel_id)
            .with("closing_participant", param.close_participant)
            .with("nonce", param.nonce);
        self.emit(event);
        Ok(())
    }

    pub fn cooperative_settle(&mut self, param: &CooperativeSettleParam) -> Result<(), MicropayError> {
        debug!("CooperativeSettle channel {}: {} / {}", param.channel_id, param.p1_balance, param.p2_balance);
        self.require_either_witness(&param.p1, &param.p2)?;
        let (channel, _, _) = self.load_live_channel(param.channel_id, &param.p1, &param.p2)?;
        Self::require_state(&channel, ChannelState::Opened)?;
        let available = channel.available_deposit()?;
        let total = checked_add(param.p1_balance, param.p2_balance, "settled balances")?;
        if total != available {
            return Err(MicropayError::math(format!("balances add up to {total}, the channel holds {available}")));
        }
        let digest = messages::cooperative_settle_digest(
            param.channel_id,
            &param.p1,
            param.p1_balance,
            &param.p2,
            param.p2_balance,
        );
        self.verify(&param.p1, &param.p1_pubkey, &param.p1_sig, &digest)?;
        self.verify(&param.p2, &param.p2_pubkey, &param.p2_sig, &digest)?;

        let mut store = self.store();
        store.delete_channel_id(&param.p1, &param.p2);
        store.delete_channel(param.channel_id);
        self.pay_out(param.p1, param.p1_balance)?;
        self.pay_out(param.p2, param.p2_balance)?;
        info!("Channel {} settled cooperatively", param.channel_id);
        let event = self
            .event(EventKind::ChannelCooperativeSettled)
            .participant(param.p1)
            .participant(param.p2)
            .with("channel_identifier", param.channel_id)
            .with("participant1", param.p1)
            .with("participant1_amount", param.p1_balance)
            .with("participant2", param.p2)
            .with("participant2_amount", param.p2_balance);
        self.emit(event);
        Ok(())
    }

    /// Checks a submitted `(transferred, locked, locks_root)` against the balance hash stored for a side.
    fn check_balance_commitment(
        stored: &[u8],
        owner: &Address,
        transferred: u64,
        locked: u64,
        locks_root: &[u8],
    ) -> Result<(), MicropayError> {
        if !(locks_root.is_empty() || locks_root.len() == HASH_LEN) {
            return Err(MicropayError::malformed(format!("locks root must be empty or {HASH_LEN} bytes")));
        }
        let matches = if stored.iter().all(|b| *b == 0) {
            transferred == 0 && locked == 0 && locks_root.is_empty()
        } else {
            messages::balance_hash(transferred, locked, locks_root).as_slice() == stored
        };
        if !matches {
            warn!("Settlement values for {owner} do not match its balance hash");
            return Err(MicropayError::state(format!("settlement values for {owner} do not match the balance proof")));
        }
        Ok(())
    }

    pub fn settle_channel(&mut self, param: &SettleChannelParam) -> Result<(), MicropayError> {
        debug!("SettleChannel {}", param.channel_id);
        self.require_either_witness(&param.p1, &param.p2)?;
        let (mut channel, side1, side2) = self.load_live_channel(param.channel_id, &param.p1, &param.p2)?;
        Self::require_state(&channel, ChannelState::Closed)?;
        let height = self.runtime.block_height();
        if height <= channel.settle_block_height {
            return Err(MicropayError::state(format!(
                "channel {} cannot be settled before block {}",
                param.channel_id,
                channel.settle_block_height.saturating_add(1)
            )));
        }
        let first = channel.participant(side1);
        let second = channel.participant(side2);
        let (p1, p2) = (&param.p1, &param.p2);
        Self::check_balance_commitment(
            &first.balance_hash,
            p1,
            param.p1_transferred,
            param.p1_locked,
            &param.p1_locks_root,
        )?;
        Self::check_balance_commitment(
            &second.balance_hash,
            p2,
            param.p2_transferred,
            param.p2_locked,
            &param.p2_locks_root,
        )?;

        let mut sides = [
            (side1, param.p1, &param.p1_locks_root, SettlementInput {
                deposit: first.deposit,
                withdrawn: first.withdraw_amount,
                transferred: param.p1_transferred,
                locked: param.p1_locked,
            }),
            (side2, param.p2, &param.p2_locks_root, SettlementInput {
                deposit: second.deposit,
                withdrawn: second.withdraw_amount,
                transferred: param.p2_transferred,
                locked: param.p2_locked,
            }),
        ];
        if needs_swap(&sides[0].3, &sides[1].3) {
            sides.swap(0, 1);
        }
        let [(s1_side, s1_addr, s1_root, s1), (s2_side, s2_addr, s2_root, s2)] = sides;
        let outcome = settle_amounts(&s1, &s2)?;
        let settled = [
            (s1_side, s1_addr, s2_addr, s1_root, outcome.p1_amount, outcome.p1_locked),
            (s2_side, s2_addr, s1_addr, s2_root, outcome.p2_amount, outcome.p2_locked),
        ];
        for (side, _, _, root, _, locked) in &settled {
            let participant = channel.participant_mut(*side);
            participant.locks_root = root.to_vec();
            participant.locked_amount = *locked;
        }

        let mut store = self.store();
        store.delete_channel(param.channel_id);
        store.delete_channel_id(&param.p1, &param.p2);
        for (side, sender, receiver, _, _, _) in &settled {
            let participant = channel.participant(*side);
            if participant.locked_amount > 0 && !participant.locks_root.is_empty() {
                let data = UnlockDataInfo {
                    locks_root: participant.locks_root.clone(),
                    locked_amount: participant.locked_amount,
                };
                debug!("Holding back {} of {sender}'s pending locks for {receiver}", data.locked_amount);
                store.put_unlock_data(param.channel_id, sender, receiver, &data);
            }
        }
        for (_, address, _, _, amount, _) in &settled {
            self.pay_out(*address, *amount)?;
        }
        info!(
            "Channel {} settled: {s1_addr} gets {}, {s2_addr} gets {}",
            param.channel_id, outcome.p1_amount, outcome.p2_amount
        );
        let event = self
            .event(EventKind::ChannelSettled)
            .participant(s1_addr)
            .participant(s2_addr)
            .with("channel_identifier", param.channel_id)
            .with("participant1", s1_addr)
            .with("participant1_amount", outcome.p1_amount)
            .with("participant2", s2_addr)
            .with("participant2_amount", outcome.p2_amount);
        self.emit(event);
        Ok(())
    }

    pub fn unlock(&mut self, param: &UnlockParam) -> Result<(), MicropayError> {
        debug!("Unlock on channel {} for {} from {}", param.channel_id, param.participant, param.partner);
        self.require_witness(&param.participant)?;
        let leaves = &param.merkle_tree_leaves;
        if leaves.is_empty() || leaves.len() % merkle::LEAF_LEN != 0 {
            return Err(MicropayError::malformed(format!(
                "merkle leaves must be a non-empty multiple of {} bytes",
                merkle::LEAF_LEN
            )));
        }
        let store = self.store();
        if store.get_channel_id(&param.participant, &param.partner)? == param.channel_id {
            return Err(MicropayError::state(format!("channel {} has not been settled", param.channel_id)));
        }
        if store.get_channel(param.channel_id)?.is_some() {
            return Err(MicropayError::state(format!("channel {} still has a record", param.channel_id)));
        }
        let data = store
            .get_unlock_data(param.channel_id, &param.partner, &param.participant)?
            .ok_or_else(|| {
                let reason = format!("no pending locks of {} on channel {}", param.partner, param.channel_id);
                MicropayError::not_found(reason)
            })?;
        if data.locked_amount == 0 {
            return Err(MicropayError::math("nothing is locked"));
        }
        let registry = SecretRegistry::new(self.runtime.storage());
        let (root, unlockable) = merkle::root_and_unlocked_amount(leaves, &registry)?;
        if root.as_slice() != data.locks_root.as_slice() {
            warn!("Leaves do not match the locks root of channel {}", param.channel_id);
            return Err(MicropayError::state("merkle leaves do not match the stored locks root"));
        }
        let unlocked = unlockable.min(data.locked_amount);
        let returned = checked_sub(data.locked_amount, unlocked, "returned locks")?;

        self.store().delete_unlock_data(param.channel_id, &param.partner, &param.participant);
        self.pay_out(param.participant, unlocked)?;
        self.pay_out(param.partner, returned)?;
        info!("Unlocked {unlocked} for {} on channel {}, {returned} returned", param.participant, param.channel_id);
        let event = self
            .event(EventKind::ChannelUnlocked)
            .participant(param.participant)
            .participant(param.partner)
            .with("channel_identifier", param.channel_id)
            .with("participant", param.participant)
            .with("partner", param.partner)
            .with("locksroot", data.locks_root)
            .with("unlocked_amount", unlocked)
            .with("returned_tokens", returned);
        self.emit(event);
        Ok(())
    }

    pub fn register_secret(&mut self, secret: &[u8]) -> Result<(), MicropayError> {
        let height = self.runtime.block_height();
        let secret_hash = SecretRegistry::new(self.runtime.storage()).register(secret, height)?;
        let event = self
            .event(EventKind::SecretRevealed)
            .with("secrethash", secret_hash.to_vec())
            .with("secret", secret)
            .with("block_height", height);
        self.emit(event);
        Ok(())
    }

    /// Registers every 32-byte secret in `secrets`. A secret that fails is skipped, and the result is
    /// `false` if any did.
    pub fn register_secret_batch(&mut self, secrets: &[u8]) -> Result<bool, MicropayError> {
        if secrets.is_empty() || secrets.len() % SECRET_LEN != 0 {
            return Err(MicropayError::malformed(format!("secrets must be a non-empty multiple of {SECRET_LEN} bytes")));
        }
        let mut all_registered = true;
        for (i, secret) in secrets.chunks_exact(SECRET_LEN).enumerate() {
            if let Err(err) = self.register_secret(secret) {
                warn!("Secret #{i} of the batch was not registered: {err}");
                all_registered = false;
            }
        }
        Ok(all_registered)
    }

    pub fn fast_transfer(&mut self, param: &FastTransferParam) -> Result<(), MicropayError> {
        debug!("FastTransfer {} of {} from {} to {}", param.payment_id, param.amount, param.from, param.to);
        self.require_witness(&param.from)?;
        if param.amount == 0 {
            return Err(MicropayError::math("amount must be greater than zero"));
        }
        if param.from == param.to {
            return Err(MicropayError::state("sender and recipient are the same"));
        }
        AssetBridge::new(&mut *self.runtime, self.config.asset_contract).transfer(param.from, param.to, param.amount)?;
        let event = self
            .event(EventKind::FastTransfer)
            .participant(param.from)
            .participant(param.to)
            .with("payment_id", param.payment_id)
            .with("from", param.from)
            .with("to", param.to)
            .with("amount", param.amount);
        self.emit(event);
        Ok(())
    }
}
