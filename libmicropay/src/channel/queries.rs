//! Read-only operations.

use crate::address::Address;
use crate::channel::data_objects::{ChannelInfo, ChannelState, Participant};
use crate::channel::state_machine::ChannelEngine;
use crate::channel::store::INITIAL_CHANNEL_COUNTER;
use crate::crypto::SignatureScheme;
use crate::error::MicropayError;
use crate::host::Runtime;
use crate::secret_registry::{SecretLookup, SecretRegistry};

impl<R: Runtime, V: SignatureScheme> ChannelEngine<'_, R, V> {
    /// The channel record, or a `Settled` placeholder if there is none.
    pub fn channel_info(&mut self, channel_id: u64) -> Result<ChannelInfo, MicropayError> {
        Ok(self.store().get_channel(channel_id)?.unwrap_or_else(|| ChannelInfo::settled(channel_id)))
    }

    pub fn participant_info(
        &mut self,
        channel_id: u64,
        participant: &Address,
        partner: &Address,
    ) -> Result<Participant, MicropayError> {
        let channel = self
            .store()
            .get_channel(channel_id)?
            .ok_or_else(|| MicropayError::not_found(format!("channel {channel_id}")))?;
        let (me, _) = channel.sides_for(participant, partner)?;
        Ok(channel.participant(me).clone())
    }

    pub fn channel_identifier(&mut self, a: &Address, b: &Address) -> Result<u64, MicropayError> {
        self.store().get_channel_id(a, b)
    }

    pub fn channel_counter(&mut self) -> Result<u64, MicropayError> {
        self.store().channel_counter()
    }

    /// Ids of every open channel `participant` takes part in, oldest first.
    pub fn open_channels(&mut self, participant: &Address) -> Result<Vec<u64>, MicropayError> {
        let store = self.store();
        let counter = store.channel_counter()?;
        let mut ids = Vec::new();
        for channel_id in INITIAL_CHANNEL_COUNTER + 1..=counter {
            if let Some(channel) = store.get_channel(channel_id)? {
                if channel.state == ChannelState::Opened && channel.has_participant(participant) {
                    ids.push(channel_id);
                }
            }
        }
        Ok(ids)
    }

    pub fn node_pubkey(&mut self, wallet: &Address) -> Result<Vec<u8>, MicropayError> {
        let contract = self.runtime.contract_address();
        self.store()
            .get_pubkey(&contract, wallet)?
            .ok_or_else(|| MicropayError::not_found(format!("no public key registered for {wallet}")))
    }

    /// Block height at which the pre-image of `secret_hash` was revealed, 0 if never.
    pub fn secret_reveal_height(&mut self, secret_hash: &[u8]) -> Result<u64, MicropayError> {
        let registry = SecretRegistry::new(self.runtime.storage());
        Ok(registry.reveal_height(secret_hash)?.unwrap_or(0))
    }
}
