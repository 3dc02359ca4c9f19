//! Channel records and the operations that drive them.
//!
//! A channel moves `Opened → Closed → Settled`, or straight from `Opened` to `Settled` when both parties
//! settle cooperatively. Settled channels are removed from storage; what is left of them are unlock entries
//! for locks that were still pending at settlement.

pub mod data_objects;
pub mod params;
mod queries;
pub mod settlement;
mod state_machine;
pub mod store;

pub use data_objects::{ChannelInfo, ChannelState, Participant, Side, UnlockDataInfo};
pub use state_machine::ChannelEngine;
pub use store::ChannelStore;
