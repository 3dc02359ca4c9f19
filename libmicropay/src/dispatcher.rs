//! Entry point: routes an operation name and its encoded input to the channel engine.

use crate::channel::params::*;
use crate::channel::ChannelEngine;
use crate::codec::{from_bytes, to_bytes, ByteSink, Decodable, ZeroCopySink};
use crate::config::EngineConfig;
use crate::crypto::SignatureScheme;
use crate::error::MicropayError;
use crate::events::ContractEvent;
use crate::host::Runtime;
use log::*;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const BYTE_FALSE: u8 = 0x00;
pub const BYTE_TRUE: u8 = 0x01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    OpenChannel,
    SetTotalDeposit,
    SetTotalWithdraw,
    CooperativeSettle,
    CloseChannel,
    Unlock,
    RegisterSecret,
    RegisterSecretBatch,
    GetSecretRevealBlockHeight,
    UpdateNonClosingBalanceProof,
    SettleChannel,
    GetChannelInfo,
    GetAllOpenChannels,
    GetChannelCounter,
    GetChannelParticipantInfo,
    GetChannelIdentifier,
    GetNodePubKey,
    FastTransfer,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::OpenChannel,
        Operation::SetTotalDeposit,
        Operation::SetTotalWithdraw,
        Operation::CooperativeSettle,
        Operation::CloseChannel,
        Operation::Unlock,
        Operation::RegisterSecret,
        Operation::RegisterSecretBatch,
        Operation::GetSecretRevealBlockHeight,
        Operation::UpdateNonClosingBalanceProof,
        Operation::SettleChannel,
        Operation::GetChannelInfo,
        Operation::GetAllOpenChannels,
        Operation::GetChannelCounter,
        Operation::GetChannelParticipantInfo,
        Operation::GetChannelIdentifier,
        Operation::GetNodePubKey,
        Operation::FastTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::OpenChannel => "OpenChannel",
            Operation::SetTotalDeposit => "SetTotalDeposit",
            Operation::SetTotalWithdraw => "SetTotalWithdraw",
            Operation::CooperativeSettle => "CooperativeSettle",
            Operation::CloseChannel => "CloseChannel",
            Operation::Unlock => "Unlock",
            Operation::RegisterSecret => "RegisterSecret",
            Operation::RegisterSecretBatch => "RegisterSecretBatch",
            Operation::GetSecretRevealBlockHeight => "GetSecretRevealBlockHeight",
            Operation::UpdateNonClosingBalanceProof => "UpdateNonClosingBalanceProof",
            Operation::SettleChannel => "SettleChannel",
            Operation::GetChannelInfo => "GetChannelInfo",
            Operation::GetAllOpenChannels => "GetAllOpenChannels",
            Operation::GetChannelCounter => "GetChannelCounter",
            Operation::GetChannelParticipantInfo => "GetChannelParticipantInfo",
            Operation::GetChannelIdentifier => "GetChannelIdentifier",
            Operation::GetNodePubKey => "GetNodePubKey",
            Operation::FastTransfer => "FastTransfer",
        }
    }

    /// Queries never write to storage or move funds.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Operation::GetSecretRevealBlockHeight
                | Operation::GetChannelInfo
                | Operation::GetAllOpenChannels
                | Operation::GetChannelCounter
                | Operation::GetChannelParticipantInfo
                | Operation::GetChannelIdentifier
                | Operation::GetNodePubKey
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = MicropayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| MicropayError::malformed(format!("unknown operation '{s}'")))
    }
}

/// The result of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub output: Vec<u8>,
    pub events: Vec<ContractEvent>,
    /// Set when the invocation failed. The host must then discard every write the invocation made.
    pub error: Option<MicropayError>,
}

impl Response {
    fn success(output: Vec<u8>, events: Vec<ContractEvent>) -> Self {
        Self { output, events, error: None }
    }

    fn failure(error: MicropayError) -> Self {
        Self { output: vec![BYTE_FALSE], events: Vec::new(), error: Some(error) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the output is the single truthy byte.
    pub fn is_true(&self) -> bool {
        self.output.as_slice() == [BYTE_TRUE]
    }

    /// Interprets an 8-byte little-endian output.
    pub fn output_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.output.as_slice().try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    pub fn decode_output<T: Decodable>(&self) -> Result<T, MicropayError> {
        Ok(from_bytes(&self.output)?)
    }
}

fn flag(value: bool) -> Vec<u8> {
    vec![if value { BYTE_TRUE } else { BYTE_FALSE }]
}

fn done(result: Result<(), MicropayError>) -> Result<Vec<u8>, MicropayError> {
    result.map(|_| flag(true))
}

fn le_u64(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

fn encode_ids(ids: &[u64]) -> Vec<u8> {
    let mut sink = ZeroCopySink::new();
    sink.write_compact_size(ids.len() as u64);
    for id in ids {
        sink.write_var_uint(*id);
    }
    sink.into_bytes()
}

fn dispatch<R: Runtime, V: SignatureScheme>(
    engine: &mut ChannelEngine<'_, R, V>,
    op: Operation,
    input: &[u8],
) -> Result<Vec<u8>, MicropayError> {
    match op {
        Operation::OpenChannel => engine.open_channel(&from_bytes(input)?).map(le_u64),
        Operation::SetTotalDeposit => done(engine.set_total_deposit(&from_bytes(input)?)),
        Operation::SetTotalWithdraw => done(engine.set_total_withdraw(&from_bytes(input)?)),
        Operation::CooperativeSettle => done(engine.cooperative_settle(&from_bytes(input)?)),
        Operation::CloseChannel => done(engine.close_channel(&from_bytes(input)?)),
        Operation::Unlock => done(engine.unlock(&from_bytes(input)?)),
        Operation::RegisterSecret => {
            let param: RegisterSecretParam = from_bytes(input)?;
            done(engine.register_secret(&param.secret))
        }
        Operation::RegisterSecretBatch => {
            let param: RegisterSecretBatchParam = from_bytes(input)?;
            engine.register_secret_batch(&param.secrets).map(flag)
        }
        Operation::GetSecretRevealBlockHeight => {
            let param: SecretHashParam = from_bytes(input)?;
            engine.secret_reveal_height(&param.secret_hash).map(le_u64)
        }
        Operation::UpdateNonClosingBalanceProof => done(engine.update_non_closing_balance_proof(&from_bytes(input)?)),
        Operation::SettleChannel => done(engine.settle_channel(&from_bytes(input)?)),
        Operation::GetChannelInfo => {
            let param: ChannelIdParam = from_bytes(input)?;
            engine.channel_info(param.channel_id).map(|info| to_bytes(&info))
        }
        Operation::GetAllOpenChannels => {
            let param: ParticipantParam = from_bytes(input)?;
            engine.open_channels(&param.participant).map(|ids| encode_ids(&ids))
        }
        Operation::GetChannelCounter => {
            from_bytes::<NoParam>(input)?;
            engine.channel_counter().map(le_u64)
        }
        Operation::GetChannelParticipantInfo => {
            let param: ParticipantInfoParam = from_bytes(input)?;
            engine.participant_info(param.channel_id, &param.participant, &param.partner).map(|p| to_bytes(&p))
        }
        Operation::GetChannelIdentifier => {
            let param: ChannelIdentifierParam = from_bytes(input)?;
            engine.channel_identifier(&param.participant1, &param.participant2).map(le_u64)
        }
        Operation::GetNodePubKey => {
            let param: ParticipantParam = from_bytes(input)?;
            engine.node_pubkey(&param.participant)
        }
        Operation::FastTransfer => done(engine.fast_transfer(&from_bytes(input)?)),
    }
}

/// Runs one operation. On failure the response carries the falsy byte, no events and the error.
pub fn invoke<R: Runtime, V: SignatureScheme>(
    runtime: &mut R,
    config: &EngineConfig,
    op: &str,
    input: &[u8],
) -> Response {
    let op = match op.parse::<Operation>() {
        Ok(op) => op,
        Err(err) => {
            warn!("{err}");
            return Response::failure(err);
        }
    };
    let mut engine = ChannelEngine::<R, V>::new(runtime, config);
    match dispatch(&mut engine, op, input) {
        Ok(output) => {
            debug!("{op} succeeded with {} output byte(s)", output.len());
            Response::success(output, engine.into_events())
        }
        Err(err) => {
            warn!("{op} failed: {err}");
            Response::failure(err)
        }
    }
}
