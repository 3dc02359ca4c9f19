//! Native payment-channel settlement engine.
//!
//! Two parties fund a channel on-chain, exchange signed balance proofs off-chain and later reconcile
//! on-chain, either cooperatively or through close/update/settle. Pending hash-timelocked transfers are
//! released with [`channel::ChannelEngine::unlock`] against the on-chain [`secret_registry::SecretRegistry`].
//!
//! The engine is a pure state transducer: every operation reads and writes the host's key-value store
//! through a [`host::Runtime`], pays out through the external asset contract, and collects
//! [`events::ContractEvent`]s. [`dispatcher::invoke`] is the entry point a host calls.

pub mod address;
pub mod amount;
pub mod asset;
pub mod channel;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod helpers;
pub mod host;
pub mod merkle;
pub mod messages;
pub mod secret_registry;
pub mod storage;

#[cfg(test)]
mod tests;

pub use address::Address;
pub use config::EngineConfig;
pub use dispatcher::{invoke, Operation, Response};
pub use error::{ErrorKind, MicropayError};
