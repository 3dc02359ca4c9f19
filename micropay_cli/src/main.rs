use anyhow::anyhow;
use clap::Parser;
use ed25519_dalek::SigningKey;
use libmicropay::channel::ChannelStore;
use libmicropay::crypto::{sign_digest, Ed25519Scheme};
use libmicropay::host::MemoryHost;
use libmicropay::messages;
use libmicropay::storage::{FileStore, StateStore};
use libmicropay::{Address, Operation};
use log::*;
use micropay_cli::config::{CliCommand, Config, GlobalOptions, InvokeCommand, MessageCommand, SignCommand};
use micropay_cli::error::CliError;
use micropay_cli::operations::{describe_output, encode_input};
use micropay_cli::settings::{default_config_path, default_state_path, Settings};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

fn main() {
    env_logger::init();
    let config: Config = Config::parse();
    let (global_options, command) = config.to_parts();

    let result = match command {
        CliCommand::Keygen => exec_keygen(),
        CliCommand::Address { pubkey } => exec_address(&pubkey),
        CliCommand::Sign(cmd) => exec_sign(cmd),
        CliCommand::Invoke(cmd) => exec_invoke(cmd, global_options),
        CliCommand::State => exec_state(global_options),
    };

    if let Err(err) = result {
        eprintln!("** Error ** \n {err}");
        std::process::exit(1);
    }
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, CliError> {
    let value = value.trim();
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| CliError::InvalidArgument { field, reason: e.to_string() })
}

fn exec_keygen() -> Result<(), anyhow::Error> {
    let key = SigningKey::generate(&mut OsRng);
    let secret = Zeroizing::new(hex::encode(key.to_bytes()));
    let pubkey = key.verifying_key();
    println!("secret:  {}", secret.as_str());
    println!("pubkey:  {}", hex::encode(pubkey.as_bytes()));
    println!("address: {}", Address::from_public_key(pubkey.as_bytes()));
    Ok(())
}

fn exec_address(pubkey: &str) -> Result<(), anyhow::Error> {
    let bytes = decode_hex("pubkey", pubkey)?;
    if bytes.len() != 32 {
        return Err(anyhow!("A public key is 32 bytes, got {}", bytes.len()));
    }
    println!("{}", Address::from_public_key(&bytes));
    Ok(())
}

fn exec_sign(cmd: SignCommand) -> Result<(), anyhow::Error> {
    let digest = match cmd.message {
        MessageCommand::BalanceHash { transferred, locked, locks_root } => {
            let locks_root = decode_hex("locks_root", &locks_root)?;
            println!("{}", hex::encode(messages::balance_hash(transferred, locked, &locks_root)));
            return Ok(());
        }
        MessageCommand::BalanceProof { channel_id, balance_hash, nonce, additional_hash } => {
            let balance_hash = decode_hex("balance_hash", &balance_hash)?;
            let additional_hash = decode_hex("additional_hash", &additional_hash)?;
            messages::balance_proof_digest(channel_id, &balance_hash, nonce, &additional_hash)
        }
        MessageCommand::BalanceProofUpdate { channel_id, balance_hash, nonce, additional_hash, close_signature } => {
            let balance_hash = decode_hex("balance_hash", &balance_hash)?;
            let additional_hash = decode_hex("additional_hash", &additional_hash)?;
            let close_signature = decode_hex("close_signature", &close_signature)?;
            messages::balance_proof_update_digest(channel_id, &balance_hash, nonce, &additional_hash, &close_signature)
        }
        MessageCommand::Withdraw { channel_id, participant, total_withdraw } => {
            messages::withdraw_digest(channel_id, &participant, total_withdraw)
        }
        MessageCommand::CooperativeSettle { channel_id, p1, p1_balance, p2, p2_balance } => {
            messages::cooperative_settle_digest(channel_id, &p1, p1_balance, &p2, p2_balance)
        }
    };
    let secret = Zeroizing::new(decode_hex("secret", &cmd.secret)?);
    let secret: Zeroizing<[u8; 32]> = Zeroizing::new(
        secret.as_slice().try_into().map_err(|_| anyhow!("A secret key is 32 bytes, got {}", secret.len()))?,
    );
    let key = SigningKey::from_bytes(&secret);
    let pubkey = key.verifying_key();
    println!("digest:    {}", hex::encode(digest));
    println!("signature: {}", hex::encode(sign_digest(&key, &digest)));
    println!("pubkey:    {}", hex::encode(pubkey.as_bytes()));
    println!("address:   {}", Address::from_public_key(pubkey.as_bytes()));
    Ok(())
}

fn load_host(global: &GlobalOptions) -> Result<(MemoryHost, FileStore), anyhow::Error> {
    let config_path = global.config_file.clone().unwrap_or_else(default_config_path);
    let settings = Settings::load_or_default(&config_path)?;
    let store = FileStore::new(global.state_file.clone().unwrap_or_else(default_state_path))?;
    let state = if store.exists() {
        debug!("Loading ledger state from {}", store.path().display());
        store.load_state()?
    } else {
        info!("No ledger at {}. Starting from the genesis balances.", store.path().display());
        settings.genesis_state()?
    };
    Ok((MemoryHost::with_state(settings.engine, state), store))
}

fn exec_invoke(cmd: InvokeCommand, global: GlobalOptions) -> Result<(), anyhow::Error> {
    let op: Operation = cmd.operation.parse()?;
    let yaml = cmd.input.as_ref().map(std::fs::read_to_string).transpose()?;
    let input = encode_input(op, yaml.as_deref())?;
    let (mut host, mut store) = load_host(&global)?;
    if let Some(height) = cmd.height {
        host.set_block_height(height);
    }
    host.set_witnesses(cmd.witnesses);

    let response = host.execute::<Ed25519Scheme>(op.as_str(), &input);
    println!("output: {}", hex::encode(&response.output));
    for event in &response.events {
        println!("event:  {}", serde_json::to_string(event)?);
    }
    if let Some(err) = response.error {
        return Err(anyhow!("{op} failed ({}): {err}", err.kind()));
    }
    println!("result: {}", describe_output(op, &response.output)?);
    if !op.is_query() {
        store.write_state(host.state())?;
        info!("Ledger saved to {}", store.path().display());
    }
    Ok(())
}

fn exec_state(global: GlobalOptions) -> Result<(), anyhow::Error> {
    let (host, _) = load_host(&global)?;
    let mut storage = host.state().storage.clone();
    let counter = ChannelStore::new(&mut storage).channel_counter()?;
    println!("block height:    {}", host.state().block_height);
    println!("channel counter: {counter}");
    for (account, balance) in host.state().ledger.balances() {
        println!("{account}: {balance}");
    }
    Ok(())
}
