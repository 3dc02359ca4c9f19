use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Event type identifiers. The numeric values are part of the external interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ChannelOpened = 1,
    ChannelClose = 2,
    ChannelSettled = 3,
    ChannelCooperativeSettled = 4,
    ChannelUnlocked = 5,
    NonClosingBPFUpdate = 6,
    SetTotalDeposit = 7,
    SetTotalWithdraw = 8,
    SecretRevealed = 9,
    FastTransfer = 10,
    SetFee = 11,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::ChannelOpened,
        EventKind::ChannelClose,
        EventKind::ChannelSettled,
        EventKind::ChannelCooperativeSettled,
        EventKind::ChannelUnlocked,
        EventKind::NonClosingBPFUpdate,
        EventKind::SetTotalDeposit,
        EventKind::SetTotalWithdraw,
        EventKind::SecretRevealed,
        EventKind::FastTransfer,
        EventKind::SetFee,
    ];

    pub fn id(self) -> u64 {
        self as u64
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventValue {
    U64(u64),
    Address(Address),
    Bytes(
        #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")] Vec<u8>,
    ),
    Bool(bool),
}

impl From<u64> for EventValue {
    fn from(v: u64) -> Self {
        EventValue::U64(v)
    }
}

impl From<Address> for EventValue {
    fn from(v: Address) -> Self {
        EventValue::Address(v)
    }
}

impl From<Vec<u8>> for EventValue {
    fn from(v: Vec<u8>) -> Self {
        EventValue::Bytes(v)
    }
}

impl From<&[u8]> for EventValue {
    fn from(v: &[u8]) -> Self {
        EventValue::Bytes(v.to_vec())
    }
}

impl From<bool> for EventValue {
    fn from(v: bool) -> Self {
        EventValue::Bool(v)
    }
}

/// A notification appended to the invocation's event list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract: Address,
    pub kind: EventKind,
    pub participants: Vec<Address>,
    pub payload: BTreeMap<String, EventValue>,
}

impl ContractEvent {
    pub fn new(contract: Address, kind: EventKind) -> Self {
        Self { contract, kind, participants: Vec::new(), payload: BTreeMap::new() }
    }

    pub fn participant(mut self, address: Address) -> Self {
        if !self.participants.contains(&address) {
            self.participants.push(address);
        }
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<EventValue>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&EventValue> {
        self.payload.get(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.payload.get(key) {
            Some(EventValue::U64(v)) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_sequential() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.id(), i as u64 + 1);
            assert_eq!(EventKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(EventKind::from_id(0), None);
        assert_eq!(EventKind::from_id(12), None);
        assert_eq!(EventKind::SecretRevealed.to_string(), "SecretRevealed");
    }

    #[test]
    fn builder() {
        let a = Address::new([1u8; 20]);
        let event = ContractEvent::new(Address::new([10u8; 20]), EventKind::ChannelOpened)
            .participant(a)
            .participant(a)
            .with("channel_id", 101u64)
            .with("participant1", a);
        assert_eq!(event.participants, vec![a]);
        assert_eq!(event.get_u64("channel_id"), Some(101));
        assert_eq!(event.get("participant1"), Some(&EventValue::Address(a)));
        assert_eq!(event.get_u64("participant1"), None);
    }

    #[test]
    fn serializes_bytes_as_hex() {
        let event = ContractEvent::new(Address::default(), EventKind::SecretRevealed).with("secret", vec![0xab, 0xcd]);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""Bytes":"abcd""#), "{json}");
    }
}
