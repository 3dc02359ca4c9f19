use clap::{Args, Parser, Subcommand};
use libmicropay::Address;
use std::path::PathBuf;

/// Micropay payment channels.
///
/// Generates keys, signs off-chain messages and drives the channel engine against a local ledger.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Path to the configuration file. The default is `$HOME/.micropay/config.yml`.
    #[arg(long = "config-file", short = 'c', env = "MICROPAY_CONFIG")]
    pub config_file: Option<PathBuf>,
    /// Path to the ledger state. The default is `$HOME/.micropay/state.ron`.
    #[arg(long = "state", short = 's', env = "MICROPAY_STATE")]
    pub state_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Generate a new Ed25519 key pair and print its address.
    #[command(name = "keygen", alias = "new-key")]
    Keygen,
    /// Derive the address of a public key.
    #[command(name = "address")]
    Address {
        /// Hex-encoded 32-byte public key.
        pubkey: String,
    },
    /// Compute the digest of an off-chain message and sign it.
    #[command(name = "sign")]
    Sign(SignCommand),
    /// Run an operation against the local ledger.
    #[command(name = "invoke", alias = "call")]
    Invoke(InvokeCommand),
    /// Print the block height, channel counter and token balances.
    #[command(name = "state", alias = "status")]
    State,
}

#[derive(Debug, Args)]
pub struct SignCommand {
    /// Hex-encoded 32-byte Ed25519 secret key.
    #[arg(long = "secret", env = "MICROPAY_SECRET", hide_env_values = true)]
    pub secret: String,
    #[command(subcommand)]
    pub message: MessageCommand,
}

#[derive(Debug, Subcommand)]
pub enum MessageCommand {
    /// A balance proof handed to the partner, used when closing.
    #[command(name = "balance-proof")]
    BalanceProof {
        #[arg(long)]
        channel_id: u64,
        /// Hex-encoded 32-byte balance hash. See `balance-hash`.
        #[arg(long)]
        balance_hash: String,
        #[arg(long)]
        nonce: u64,
        #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
        additional_hash: String,
    },
    /// The non-closing participant's countersignature on the closer's balance proof.
    #[command(name = "balance-proof-update")]
    BalanceProofUpdate {
        #[arg(long)]
        channel_id: u64,
        #[arg(long)]
        balance_hash: String,
        #[arg(long)]
        nonce: u64,
        #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
        additional_hash: String,
        /// The closer's signature on the balance proof.
        #[arg(long)]
        close_signature: String,
    },
    /// Consent to a participant's new total withdraw.
    #[command(name = "withdraw")]
    Withdraw {
        #[arg(long)]
        channel_id: u64,
        #[arg(long)]
        participant: Address,
        #[arg(long)]
        total_withdraw: u64,
    },
    /// Consent to a cooperative settlement.
    #[command(name = "cooperative-settle", alias = "cosettle")]
    CooperativeSettle {
        #[arg(long)]
        channel_id: u64,
        #[arg(long)]
        p1: Address,
        #[arg(long)]
        p1_balance: u64,
        #[arg(long)]
        p2: Address,
        #[arg(long)]
        p2_balance: u64,
    },
    /// Only print the balance hash of `(transferred, locked, locks_root)`. Nothing is signed.
    #[command(name = "balance-hash")]
    BalanceHash {
        #[arg(long)]
        transferred: u64,
        #[arg(long, default_value_t = 0)]
        locked: u64,
        #[arg(long, default_value = "")]
        locks_root: String,
    },
}

#[derive(Debug, Args)]
pub struct InvokeCommand {
    /// The operation name, e.g. `OpenChannel`.
    pub operation: String,
    /// YAML file with the operation's parameters. Operations without parameters need none.
    #[arg(long = "input", short = 'i')]
    pub input: Option<PathBuf>,
    /// Addresses that sign the transaction. May be repeated.
    #[arg(long = "witness", short = 'w')]
    pub witnesses: Vec<Address>,
    /// Move the chain to this block height before running the operation.
    #[arg(long = "height")]
    pub height: Option<u64>,
}

pub struct GlobalOptions {
    pub config_file: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
}

impl Config {
    pub fn to_parts(self) -> (GlobalOptions, CliCommand) {
        let global = GlobalOptions { config_file: self.config_file, state_file: self.state_file };
        (global, self.command)
    }
}
