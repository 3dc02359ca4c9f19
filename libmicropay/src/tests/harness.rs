//! A chain with two funded parties, driven through the dispatcher exactly as a host would.

use crate::address::Address;
use crate::channel::params::*;
use crate::channel::ChannelInfo;
use crate::codec::{to_bytes, Encodable};
use crate::config::EngineConfig;
use crate::crypto::{sign_digest, Ed25519Scheme};
use crate::dispatcher::{Operation, Response};
use crate::error::ErrorKind;
use crate::helpers::Hash256;
use crate::host::MemoryHost;
use crate::messages;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

pub(crate) struct Party {
    key: SigningKey,
    pub address: Address,
}

impl Party {
    pub fn from_seed(seed: u8) -> Self {
        Self::from_key(SigningKey::from_bytes(&[seed; 32]))
    }

    pub fn random() -> Self {
        Self::from_key(SigningKey::generate(&mut OsRng))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = Address::from_public_key(key.verifying_key().as_bytes());
        Self { key, address }
    }

    pub fn pubkey(&self) -> Vec<u8> {
        self.key.verifying_key().to_bytes().to_vec()
    }

    pub fn sign(&self, digest: &Hash256) -> Vec<u8> {
        sign_digest(&self.key, digest)
    }
}

/// A balance proof as one party hands it to the other.
pub(crate) struct SignedProof {
    pub balance_hash: Vec<u8>,
    pub nonce: u64,
    pub additional_hash: Vec<u8>,
    pub signature: Vec<u8>,
}

pub(crate) struct TestChain {
    pub host: MemoryHost,
}

impl TestChain {
    pub fn new() -> Self {
        env_logger::try_init().ok();
        Self { host: MemoryHost::new(EngineConfig::default()) }
    }

    pub fn contract(&self) -> Address {
        self.host.config().contract_address
    }

    pub fn fund(&mut self, party: &Party, amount: u64) {
        self.host.mint(party.address, amount).expect("minting test funds");
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.host.balance_of(address)
    }

    pub fn set_height(&mut self, height: u64) {
        self.host.set_block_height(height);
    }

    pub fn call<P: Encodable>(&mut self, op: Operation, param: &P, signers: &[Address]) -> Response {
        self.host.set_witnesses(signers.iter().copied());
        self.host.execute::<Ed25519Scheme>(op.as_str(), &to_bytes(param))
    }

    /// Calls `op` and asserts that it failed with `kind`.
    pub fn call_err<P: Encodable>(&mut self, op: Operation, param: &P, signers: &[Address], kind: ErrorKind) {
        let response = self.call(op, param, signers);
        let err = response.error.unwrap_or_else(|| panic!("{op} should have failed with {kind}"));
        assert_eq!(err.kind(), kind, "{op} failed with {err}");
        assert_eq!(response.output, vec![0x00]);
        assert!(response.events.is_empty());
    }

    pub fn call_ok<P: Encodable>(&mut self, op: Operation, param: &P, signers: &[Address]) -> Response {
        let response = self.call(op, param, signers);
        if let Some(err) = &response.error {
            panic!("{op} failed: {err}");
        }
        response
    }

    pub fn open(&mut self, p1: &Party, p2: &Party, settle_timeout: u64) -> u64 {
        let param = OpenChannelParam {
            p1_wallet: p1.address,
            p1_pubkey: p1.pubkey(),
            p2_wallet: p2.address,
            settle_timeout,
        };
        self.call_ok(Operation::OpenChannel, &param, &[p1.address]).output_u64().expect("channel id")
    }

    pub fn deposit(&mut self, channel_id: u64, participant: &Party, partner: &Party, total: u64) {
        let param = SetTotalDepositParam {
            channel_id,
            participant: participant.address,
            partner: partner.address,
            set_total_deposit: total,
        };
        let response = self.call_ok(Operation::SetTotalDeposit, &param, &[participant.address]);
        assert!(response.is_true());
    }

    pub fn channel(&mut self, channel_id: u64) -> ChannelInfo {
        self.call_ok(Operation::GetChannelInfo, &ChannelIdParam { channel_id }, &[])
            .decode_output()
            .expect("channel info")
    }

    pub fn channel_id_of(&mut self, a: &Party, b: &Party) -> u64 {
        let param = ChannelIdentifierParam { participant1: a.address, participant2: b.address };
        self.call_ok(Operation::GetChannelIdentifier, &param, &[]).output_u64().expect("u64 output")
    }

    /// `signer` signs that it has sent `transferred` and has `locked` pending under `locks_root`.
    pub fn proof(
        &self,
        signer: &Party,
        channel_id: u64,
        nonce: u64,
        transferred: u64,
        locked: u64,
        locks_root: &[u8],
    ) -> SignedProof {
        let balance_hash = messages::balance_hash(transferred, locked, locks_root).to_vec();
        let additional_hash = vec![0u8; 32];
        let digest = messages::balance_proof_digest(channel_id, &balance_hash, nonce, &additional_hash);
        SignedProof { signature: signer.sign(&digest), balance_hash, nonce, additional_hash }
    }

    /// `closer` closes the channel, submitting the proof its partner signed.
    pub fn close(&mut self, channel_id: u64, closer: &Party, partner: &Party, proof: Option<&SignedProof>) {
        let mut param = CloseChannelParam {
            channel_id,
            closer: closer.address,
            partner: partner.address,
            balance_hash: vec![],
            nonce: 0,
            additional_hash: vec![],
            partner_sig: vec![],
            partner_pubkey: vec![],
        };
        if let Some(proof) = proof {
            param.balance_hash = proof.balance_hash.clone();
            param.nonce = proof.nonce;
            param.additional_hash = proof.additional_hash.clone();
            param.partner_sig = proof.signature.clone();
            param.partner_pubkey = partner.pubkey();
        }
        self.call_ok(Operation::CloseChannel, &param, &[closer.address]);
    }

    /// Builds the non-closing update in which `non_closer` submits the proof `closer` signed.
    pub fn update_param(
        &self,
        channel_id: u64,
        closer: &Party,
        non_closer: &Party,
        proof: &SignedProof,
    ) -> UpdateNonCloseParam {
        let digest = messages::balance_proof_update_digest(
            channel_id,
            &proof.balance_hash,
            proof.nonce,
            &proof.additional_hash,
            &proof.signature,
        );
        UpdateNonCloseParam {
            channel_id,
            close_participant: closer.address,
            non_close_participant: non_closer.address,
            balance_hash: proof.balance_hash.clone(),
            nonce: proof.nonce,
            additional_hash: proof.additional_hash.clone(),
            close_signature: proof.signature.clone(),
            non_close_signature: non_closer.sign(&digest),
            close_pubkey: closer.pubkey(),
            non_close_pubkey: non_closer.pubkey(),
        }
    }

    pub fn cooperative_settle_param(
        &self,
        channel_id: u64,
        p1: &Party,
        p1_balance: u64,
        p2: &Party,
        p2_balance: u64,
    ) -> CooperativeSettleParam {
        let digest = messages::cooperative_settle_digest(channel_id, &p1.address, p1_balance, &p2.address, p2_balance);
        CooperativeSettleParam {
            channel_id,
            p1: p1.address,
            p1_balance,
            p2: p2.address,
            p2_balance,
            p1_sig: p1.sign(&digest),
            p1_pubkey: p1.pubkey(),
            p2_sig: p2.sign(&digest),
            p2_pubkey: p2.pubkey(),
        }
    }

    pub fn withdraw_param(
        &self,
        channel_id: u64,
        participant: &Party,
        partner: &Party,
        total: u64,
    ) -> SetTotalWithdrawParam {
        let digest = messages::withdraw_digest(channel_id, &participant.address, total);
        SetTotalWithdrawParam {
            channel_id,
            participant: participant.address,
            partner: partner.address,
            total_withdraw: total,
            participant_sig: participant.sign(&digest),
            participant_pubkey: participant.pubkey(),
            partner_sig: partner.sign(&digest),
            partner_pubkey: partner.pubkey(),
        }
    }
}
