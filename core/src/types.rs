use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::checkpoint::error::CheckpointError;

pub const HASH_SIZE: usize = 32;

/// Block identity hash (32 bytes, rendered as lowercase hex)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockHash(pub [u8; HASH_SIZE]);

impl BlockHash {
    pub const NULL: BlockHash = BlockHash([0u8; HASH_SIZE]);

    /// Decode exactly 64 hex characters into a hash.
    pub fn from_hex(s: &str) -> Result<Self, CheckpointError> {
        let mut out = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut out).map_err(|e| CheckpointError::HashDecode {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(BlockHash(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// First 16 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl FromStr for BlockHash {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for BlockHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        BlockHash(bytes)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BlockHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a cumulative difficulty given either as `0x`-prefixed hex or as decimal.
pub fn parse_difficulty(s: &str) -> Result<U256, CheckpointError> {
    let err = |reason: String| CheckpointError::DifficultyDecode {
        value: s.to_string(),
        reason,
    };

    let trimmed = s.trim();
    let hex_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));

    match hex_digits {
        Some(digits) => {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err("invalid hex digits".to_string()));
            }
            U256::from_str_radix(digits, 16).map_err(|e| err(format!("{:?}", e)))
        }
        None => {
            if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(err("invalid decimal digits".to_string()));
            }
            U256::from_dec_str(trimmed).map_err(|e| err(format!("{:?}", e)))
        }
    }
}
