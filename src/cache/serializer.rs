//! Value serialization for cached entries.

use crate::error::AppResult;
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encoding used for values stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Serializer {
    /// Compact binary object encoding (MessagePack, struct fields by name)
    #[default]
    #[value(name = "msgpack")]
    MessagePack,
    /// Human-readable JSON
    Json,
}

impl Serializer {
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> AppResult<Vec<u8>> {
        match self {
            Self::MessagePack => Ok(rmp_serde::to_vec_named(value)?),
            Self::Json => Ok(serde_json::to_vec(value)?),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> AppResult<T> {
        match self {
            Self::MessagePack => Ok(rmp_serde::from_slice(bytes)?),
            Self::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

impl std::fmt::Display for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MessagePack => write!(f, "msgpack"),
            Self::Json => write!(f, "json"),
        }
    }
}
