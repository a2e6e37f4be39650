//! CAIP-2 chain identifier types.
//!
//! A CAIP-2 chain ID consists of two parts separated by a colon:
//!
//! - **Namespace**: The blockchain ecosystem (e.g., `eip155` for EVM)
//! - **Reference**: The chain-specific identifier (e.g., `31337` for a local devnet)
//!
//! # Examples
//!
//! ```
//! use paychan_types::chain::ChainId;
//!
//! let devnet = ChainId::new("eip155", "31337");
//! assert_eq!(devnet.to_string(), "eip155:31337");
//!
//! let parsed: ChainId = "eip155:1".parse().unwrap();
//! assert_eq!(parsed.namespace(), "eip155");
//! assert_eq!(parsed.reference(), "1");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A CAIP-2 compliant blockchain identifier.
///
/// Serializes to/from a colon-separated string: `"eip155:31337"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    /// The blockchain namespace (e.g., `eip155` for EVM chains).
    pub namespace: String,
    /// The chain-specific reference (e.g., `1` for Ethereum mainnet).
    pub reference: String,
}

impl ChainId {
    /// Creates a new chain ID from namespace and reference components.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    /// Returns the namespace component of the chain ID.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the reference component of the chain ID.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid chain ID string.
///
/// A valid chain ID must be in the format `namespace:reference` where both
/// components are non-empty strings.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(ChainId::new(namespace, reference))
            }
            _ => Err(ChainIdFormatError(s.into())),
        }
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChainId::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_serde_roundtrip() {
        let chain_id = ChainId::new("eip155", "31337");
        let serialized = serde_json::to_string(&chain_id).unwrap();
        assert_eq!(serialized, "\"eip155:31337\"");
        let deserialized: ChainId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(chain_id, deserialized);
    }

    #[test]
    fn test_chain_id_from_str_invalid() {
        assert!("eip155".parse::<ChainId>().is_err());
        assert!(":1".parse::<ChainId>().is_err());
        assert!("eip155:".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_id_reference_may_contain_colon() {
        let chain_id: ChainId = "custom:a:b".parse().unwrap();
        assert_eq!(chain_id.namespace(), "custom");
        assert_eq!(chain_id.reference(), "a:b");
    }
}
