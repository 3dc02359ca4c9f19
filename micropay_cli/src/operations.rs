//! Translation between YAML operation parameters and the engine's binary inputs and outputs.

use crate::error::CliError;
use libmicropay::channel::params::*;
use libmicropay::channel::{ChannelInfo, Participant};
use libmicropay::codec::{from_bytes, to_bytes, ByteSource, Encodable, ZeroCopySource};
use libmicropay::{MicropayError, Operation};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

fn parse<T: DeserializeOwned + Encodable>(op: Operation, yaml: Option<&str>) -> Result<Vec<u8>, CliError> {
    let yaml = yaml.ok_or_else(|| CliError::MissingInput(op.to_string()))?;
    let param: T = serde_yml::from_str(yaml)?;
    Ok(to_bytes(&param))
}

/// Encodes the YAML parameters of `op` into the engine's input bytes.
pub fn encode_input(op: Operation, yaml: Option<&str>) -> Result<Vec<u8>, CliError> {
    match op {
        Operation::OpenChannel => parse::<OpenChannelParam>(op, yaml),
        Operation::SetTotalDeposit => parse::<SetTotalDepositParam>(op, yaml),
        Operation::SetTotalWithdraw => parse::<SetTotalWithdrawParam>(op, yaml),
        Operation::CooperativeSettle => parse::<CooperativeSettleParam>(op, yaml),
        Operation::CloseChannel => parse::<CloseChannelParam>(op, yaml),
        Operation::Unlock => parse::<UnlockParam>(op, yaml),
        Operation::RegisterSecret => parse::<RegisterSecretParam>(op, yaml),
        Operation::RegisterSecretBatch => parse::<RegisterSecretBatchParam>(op, yaml),
        Operation::GetSecretRevealBlockHeight => parse::<SecretHashParam>(op, yaml),
        Operation::UpdateNonClosingBalanceProof => parse::<UpdateNonCloseParam>(op, yaml),
        Operation::SettleChannel => parse::<SettleChannelParam>(op, yaml),
        Operation::GetChannelInfo => parse::<ChannelIdParam>(op, yaml),
        Operation::GetAllOpenChannels | Operation::GetNodePubKey => parse::<ParticipantParam>(op, yaml),
        Operation::GetChannelCounter => Ok(to_bytes(&NoParam {})),
        Operation::GetChannelParticipantInfo => parse::<ParticipantInfoParam>(op, yaml),
        Operation::GetChannelIdentifier => parse::<ChannelIdentifierParam>(op, yaml),
        Operation::FastTransfer => parse::<FastTransferParam>(op, yaml),
    }
}

fn le_u64(output: &[u8]) -> Result<u64, CliError> {
    let bytes: [u8; 8] = output
        .try_into()
        .map_err(|_| CliError::InvalidArgument {
            field: "output",
            reason: format!("expected 8 bytes, got {}", output.len()),
        })?;
    Ok(u64::from_le_bytes(bytes))
}

fn channel_ids(output: &[u8]) -> Result<Vec<u64>, CliError> {
    let mut source = ZeroCopySource::new(output);
    let count = source.read_compact_size().map_err(MicropayError::from)?;
    (0..count).map(|_| Ok(source.read_var_uint().map_err(MicropayError::from)?)).collect()
}

/// Renders the output of a successful `op` for humans.
pub fn describe_output(op: Operation, output: &[u8]) -> Result<Value, CliError> {
    let value = match op {
        Operation::OpenChannel
        | Operation::GetChannelCounter
        | Operation::GetChannelIdentifier
        | Operation::GetSecretRevealBlockHeight => json!(le_u64(output)?),
        Operation::GetChannelInfo => {
            let info: ChannelInfo = from_bytes(output).map_err(MicropayError::from)?;
            json!(info)
        }
        Operation::GetChannelParticipantInfo => {
            let participant: Participant = from_bytes(output).map_err(MicropayError::from)?;
            json!(participant)
        }
        Operation::GetAllOpenChannels => json!(channel_ids(output)?),
        Operation::GetNodePubKey => json!(hex::encode(output)),
        _ => json!(output == [0x01]),
    };
    Ok(value)
}
