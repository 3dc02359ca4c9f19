use crate::address::Address;
use crate::amount::{checked_add, checked_sub};
use crate::codec::{ByteSink, ByteSource, CodecError, Decodable, Encodable};
use crate::error::MicropayError;
use crate::impl_codec;
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    Opened = 1,
    Closed = 2,
    /// Tombstone. Settled channels have no stored record; queries report this state instead.
    Settled = 3,
}

impl ChannelState {
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(ChannelState::Opened),
            2 => Some(ChannelState::Closed),
            3 => Some(ChannelState::Settled),
            _ => None,
        }
    }
}

impl Display for ChannelState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Opened => write!(f, "Opened"),
            ChannelState::Closed => write!(f, "Closed"),
            ChannelState::Settled => write!(f, "Settled"),
        }
    }
}

impl Encodable for ChannelState {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_var_uint(*self as u64);
    }
}

impl Decodable for ChannelState {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        let id = source.read_var_uint()?;
        ChannelState::from_id(id).ok_or(CodecError::IrregularData("unknown channel state"))
    }
}

/// One side of a channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub wallet_address: Address,
    pub deposit: u64,
    pub withdraw_amount: u64,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub balance_hash: Vec<u8>,
    pub nonce: u64,
    pub is_closer: bool,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub locks_root: Vec<u8>,
    pub locked_amount: u64,
}

impl_codec!(Participant {
    wallet_address,
    deposit,
    withdraw_amount,
    balance_hash,
    nonce,
    is_closer,
    locks_root,
    locked_amount
});

impl Participant {
    pub fn new(wallet_address: Address) -> Self {
        Self { wallet_address, ..Default::default() }
    }

    /// Replaces the stored balance proof. The new nonce must be strictly greater than the stored one.
    pub fn update_balance_proof(&mut self, nonce: u64, balance_hash: &[u8]) -> Result<(), MicropayError> {
        if nonce <= self.nonce {
            warn!(
                "Rejecting balance proof for {} with nonce {nonce}, stored nonce is {}",
                self.wallet_address, self.nonce
            );
            return Err(MicropayError::math(format!("nonce {nonce} is not greater than stored nonce {}", self.nonce)));
        }
        self.nonce = nonce;
        self.balance_hash = balance_hash.to_vec();
        Ok(())
    }
}

/// Selects one of the two participants of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// The stored channel record.
///
/// `settle_block_height` holds the settle timeout while the channel is open and the absolute settlement
/// deadline once it has been closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: u64,
    pub state: ChannelState,
    pub participant1: Participant,
    pub participant2: Participant,
    pub settle_block_height: u64,
}

impl_codec!(ChannelInfo { channel_id, state, participant1, participant2, settle_block_height });

impl ChannelInfo {
    pub fn open(channel_id: u64, p1: Address, p2: Address, settle_timeout: u64) -> Self {
        Self {
            channel_id,
            state: ChannelState::Opened,
            participant1: Participant::new(p1),
            participant2: Participant::new(p2),
            settle_block_height: settle_timeout,
        }
    }

    /// What queries report for a channel that no longer has a record.
    pub fn settled(channel_id: u64) -> Self {
        Self {
            channel_id,
            state: ChannelState::Settled,
            participant1: Participant::default(),
            participant2: Participant::default(),
            settle_block_height: 0,
        }
    }

    pub fn participant(&self, side: Side) -> &Participant {
        match side {
            Side::First => &self.participant1,
            Side::Second => &self.participant2,
        }
    }

    pub fn participant_mut(&mut self, side: Side) -> &mut Participant {
        match side {
            Side::First => &mut self.participant1,
            Side::Second => &mut self.participant2,
        }
    }

    pub fn side_of(&self, address: &Address) -> Option<Side> {
        if self.participant1.wallet_address == *address {
            Some(Side::First)
        } else if self.participant2.wallet_address == *address {
            Some(Side::Second)
        } else {
            None
        }
    }

    pub fn has_participant(&self, address: &Address) -> bool {
        self.side_of(address).is_some()
    }

    /// Resolves `participant` and `partner` to the two distinct sides of this channel, in that order.
    pub fn sides_for(&self, participant: &Address, partner: &Address) -> Result<(Side, Side), MicropayError> {
        match self.side_of(participant) {
            Some(side) if self.participant(side.other()).wallet_address == *partner => Ok((side, side.other())),
            _ => Err(MicropayError::state(format!(
                "{participant} and {partner} are not the participants of channel {}",
                self.channel_id
            ))),
        }
    }

    pub fn total_deposit(&self) -> Result<u64, MicropayError> {
        checked_add(self.participant1.deposit, self.participant2.deposit, "total deposit")
    }

    /// Deposits minus withdrawals of both sides.
    pub fn available_deposit(&self) -> Result<u64, MicropayError> {
        let withdrawn =
            checked_add(self.participant1.withdraw_amount, self.participant2.withdraw_amount, "total withdraw")?;
        checked_sub(self.total_deposit()?, withdrawn, "available deposit")
    }
}

/// Pending locks a participant still owes its partner after settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockDataInfo {
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub locks_root: Vec<u8>,
    pub locked_amount: u64,
}

impl_codec!(UnlockDataInfo { locks_root, locked_amount });
