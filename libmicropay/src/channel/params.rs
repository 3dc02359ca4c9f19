//! Decoded inputs of every operation. Fields are encoded in declaration order.

use crate::address::Address;
use crate::impl_codec;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelParam {
    pub p1_wallet: Address,
    /// Optional. When present it must derive to `p1_wallet` and is cached for node pubkey queries.
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p1_pubkey: Vec<u8>,
    pub p2_wallet: Address,
    pub settle_timeout: u64,
}

impl_codec!(OpenChannelParam { p1_wallet, p1_pubkey, p2_wallet, settle_timeout });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTotalDepositParam {
    pub channel_id: u64,
    pub participant: Address,
    pub partner: Address,
    pub set_total_deposit: u64,
}

impl_codec!(SetTotalDepositParam { channel_id, participant, partner, set_total_deposit });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTotalWithdrawParam {
    pub channel_id: u64,
    pub participant: Address,
    pub partner: Address,
    pub total_withdraw: u64,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub participant_sig: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub participant_pubkey: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub partner_sig: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub partner_pubkey: Vec<u8>,
}

impl_codec!(SetTotalWithdrawParam {
    channel_id,
    participant,
    partner,
    total_withdraw,
    participant_sig,
    participant_pubkey,
    partner_sig,
    partner_pubkey
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooperativeSettleParam {
    pub channel_id: u64,
    pub p1: Address,
    pub p1_balance: u64,
    pub p2: Address,
    pub p2_balance: u64,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p1_sig: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p1_pubkey: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p2_sig: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p2_pubkey: Vec<u8>,
}

impl_codec!(CooperativeSettleParam {
    channel_id,
    p1,
    p1_balance,
    p2,
    p2_balance,
    p1_sig,
    p1_pubkey,
    p2_sig,
    p2_pubkey
});

/// The balance proof fields may all be left empty (and `nonce` zero) when the partner never sent one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseChannelParam {
    pub channel_id: u64,
    pub closer: Address,
    pub partner: Address,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub balance_hash: Vec<u8>,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub additional_hash: Vec<u8>,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub partner_sig: Vec<u8>,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub partner_pubkey: Vec<u8>,
}

impl_codec!(CloseChannelParam {
    channel_id,
    closer,
    partner,
    balance_hash,
    nonce,
    additional_hash,
    partner_sig,
    partner_pubkey
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNonCloseParam {
    pub channel_id: u64,
    pub close_participant: Address,
    pub non_close_participant: Address,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub balance_hash: Vec<u8>,
    pub nonce: u64,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub additional_hash: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub close_signature: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub non_close_signature: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub close_pubkey: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub non_close_pubkey: Vec<u8>,
}

impl_codec!(UpdateNonCloseParam {
    channel_id,
    close_participant,
    non_close_participant,
    balance_hash,
    nonce,
    additional_hash,
    close_signature,
    non_close_signature,
    close_pubkey,
    non_close_pubkey
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleChannelParam {
    pub channel_id: u64,
    pub p1: Address,
    pub p1_transferred: u64,
    pub p1_locked: u64,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p1_locks_root: Vec<u8>,
    pub p2: Address,
    pub p2_transferred: u64,
    pub p2_locked: u64,
    #[serde(default, serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub p2_locks_root: Vec<u8>,
}

impl_codec!(SettleChannelParam {
    channel_id,
    p1,
    p1_transferred,
    p1_locked,
    p1_locks_root,
    p2,
    p2_transferred,
    p2_locked,
    p2_locks_root
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockParam {
    pub channel_id: u64,
    pub participant: Address,
    pub partner: Address,
    /// Packed 48-byte lock leaves.
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub merkle_tree_leaves: Vec<u8>,
}

impl_codec!(UnlockParam { channel_id, participant, partner, merkle_tree_leaves });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSecretParam {
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub secret: Vec<u8>,
}

impl_codec!(RegisterSecretParam { secret });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSecretBatchParam {
    /// Concatenated 32-byte secrets.
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub secrets: Vec<u8>,
}

impl_codec!(RegisterSecretBatchParam { secrets });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretHashParam {
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    pub secret_hash: Vec<u8>,
}

impl_codec!(SecretHashParam { secret_hash });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdParam {
    pub channel_id: u64,
}

impl_codec!(ChannelIdParam { channel_id });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantParam {
    pub participant: Address,
}

impl_codec!(ParticipantParam { participant });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfoParam {
    pub channel_id: u64,
    pub participant: Address,
    pub partner: Address,
}

impl_codec!(ParticipantInfoParam { channel_id, participant, partner });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentifierParam {
    pub participant1: Address,
    pub participant2: Address,
}

impl_codec!(ChannelIdentifierParam { participant1, participant2 });

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastTransferParam {
    pub payment_id: u64,
    pub from: Address,
    pub to: Address,
    pub amount: u64,
}

impl_codec!(FastTransferParam { payment_id, from, to, amount });

/// Input of operations that take no arguments. Encodes to nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParam {}

impl_codec!(NoParam {});

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{from_bytes, to_bytes, CodecError};

    #[test]
    fn open_channel_layout() {
        let param = OpenChannelParam {
            p1_wallet: Address::new([1; 20]),
            p1_pubkey: vec![],
            p2_wallet: Address::new([2; 20]),
            settle_timeout: 50,
        };
        let bytes = to_bytes(&param);
        let mut expected = vec![20];
        expected.extend_from_slice(&[1; 20]);
        expected.push(0);
        expected.push(20);
        expected.extend_from_slice(&[2; 20]);
        expected.extend_from_slice(&[0x01, 50]);
        assert_eq!(bytes, expected);
        assert_eq!(from_bytes::<OpenChannelParam>(&bytes).unwrap(), param);
    }

    #[test]
    fn truncated_and_padded_inputs() {
        let param = ChannelIdParam { channel_id: 101 };
        let bytes = to_bytes(&param);
        assert_eq!(from_bytes::<ChannelIdParam>(&bytes[..1]), Err(CodecError::UnexpectedEof));
        let mut padded = bytes.clone();
        padded.push(0);
        assert_eq!(from_bytes::<ChannelIdParam>(&padded), Err(CodecError::TrailingBytes(1)));
        assert_eq!(from_bytes::<NoParam>(&[]).unwrap(), NoParam {});
    }

    #[test]
    fn close_params_default_to_no_proof() {
        let json = r#"{
            "channel_id": 101,
            "closer": "0101010101010101010101010101010101010101",
            "partner": "0202020202020202020202020202020202020202"
        }"#;
        let param: CloseChannelParam = serde_json::from_str(json).unwrap();
        assert_eq!(param.nonce, 0);
        assert!(param.balance_hash.is_empty() && param.partner_sig.is_empty());
    }
}
