use crate::codec::{ByteSink, ByteSource, CodecError, Decodable, Encodable};
use crate::helpers::sha256;
use hex::FromHexError;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;

pub const ADDRESS_LEN: usize = 20;

/// A 20-byte account identifier. Ordering is the lexicographic order of the raw bytes, which is what the
/// participant-pair index relies on.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| CodecError::InvalidAddressLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// The address controlled by a public key: the first 20 bytes of `sha256(pubkey)`.
    pub fn from_public_key(pubkey: &[u8]) -> Self {
        let digest = sha256(pubkey);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    pub fn from_hex(hex: &str) -> Result<Self, AddressError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidStringLength);
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(hex.as_bytes(), &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Address::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

impl Encodable for Address {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_address(self);
    }
}

impl Decodable for Address {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        source.read_address()
    }
}

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Could not deserialize from hex: {0}")]
    HexDeserializationError(#[from] FromHexError),
    #[error("An address is 40 hex characters long")]
    InvalidStringLength,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let addr = Address::from_hex("00112233445566778899aabbccddeeff00112233").unwrap();
        assert_eq!(addr.as_bytes()[1], 0x11);
        assert_eq!(addr.to_string(), "00112233445566778899aabbccddeeff00112233");
        let prefixed = Address::from_hex("0x00112233445566778899aabbccddeeff00112233").unwrap();
        assert_eq!(addr, prefixed);
        assert_eq!("00112233445566778899aabbccddeeff00112233".parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn bad_hex() {
        assert!(matches!(Address::from_hex("0011"), Err(AddressError::InvalidStringLength)));
        assert!(matches!(
            Address::from_hex("zz112233445566778899aabbccddeeff00112233"),
            Err(AddressError::HexDeserializationError(_))
        ));
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = Address::new([1u8; 20]);
        let mut b_bytes = [1u8; 20];
        b_bytes[19] = 2;
        let b = Address::new(b_bytes);
        assert!(a < b);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn from_slice_checks_length() {
        assert_eq!(Address::from_slice(&[7u8; 19]), Err(CodecError::InvalidAddressLength(19)));
        assert_eq!(Address::from_slice(&[7u8; 20]).unwrap(), Address::new([7u8; 20]));
    }

    #[test]
    fn serde_as_hex_string() {
        let addr = Address::new([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
