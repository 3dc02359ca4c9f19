use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 output.
pub type Hash256 = [u8; 32];

pub fn sha256(data: &[u8]) -> Hash256 {
    Sha256::digest(data).into()
}

/// `sha256(parts[0] ‖ parts[1] ‖ …)` without building the concatenation.
pub fn sha256_concat(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn to_hex<S>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    hex::encode(bytes).serialize(s)
}

pub fn from_hex<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let hex_str = String::deserialize(de)?;
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(&hex_str);
    hex::decode(hex_str).map_err(|e| serde::de::Error::custom(format!("Invalid hex string: {e}")))
}

/// Serde adapter for byte-keyed maps, written as `{ "hex key": "hex value" }`.
pub mod hex_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<Vec<u8>, Vec<u8>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hexed: BTreeMap<String, String> = map.iter().map(|(k, v)| (hex::encode(k), hex::encode(v))).collect();
        hexed.serialize(s)
    }

    pub fn deserialize<'de, D>(de: D) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hexed = BTreeMap::<String, String>::deserialize(de)?;
        hexed
            .into_iter()
            .map(|(k, v)| {
                let k = hex::decode(&k).map_err(|e| serde::de::Error::custom(format!("Invalid hex key: {e}")))?;
                let v = hex::decode(&v).map_err(|e| serde::de::Error::custom(format!("Invalid hex value: {e}")))?;
                Ok((k, v))
            })
            .collect()
    }
}
