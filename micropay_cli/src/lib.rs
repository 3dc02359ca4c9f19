//! Operator command-line client for the micropay channel engine.
//!
//! The CLI keeps a whole in-memory chain (key-value store, token ledger and block height) in a RON state
//! file and runs operations against it exactly as a host would.

pub mod config;
pub mod error;
pub mod operations;
pub mod settings;
