//! Wire format types for EVM chain values.
//!
//! This module provides types that handle serialization and deserialization
//! of EVM-specific values at the JSON boundary.

use paychan_types::chain::ChainId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Serde helpers for `U256` amounts written as decimal strings, e.g. `"1000000"`.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a U256 as a decimal string.
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize a decimal string into a U256.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}

/// The CAIP-2 namespace for EVM-compatible chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// A numeric chain ID for EVM-compatible networks.
///
/// This is the `chainId` field of every payment channel's EIP-712 domain.
///
/// # Example
///
/// ```
/// use paychan_chain_eip155::chain::Eip155ChainReference;
/// use paychan_types::chain::ChainId;
///
/// let devnet = Eip155ChainReference::new(31337);
/// let chain_id: ChainId = devnet.into();
/// assert_eq!(chain_id.to_string(), "eip155:31337");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    /// Creates a new chain reference from a numeric chain ID.
    pub fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    /// Returns the numeric chain ID.
    pub fn inner(&self) -> u64 {
        self.0
    }

    /// Converts this chain reference to a CAIP-2 [`ChainId`].
    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(EIP155_NAMESPACE, self.0.to_string())
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != EIP155_NAMESPACE {
            return Err(Eip155ChainReferenceFormatError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        let chain_id: u64 = value.reference.parse().map_err(|_| {
            Eip155ChainReferenceFormatError::InvalidReference(value.reference.clone())
        })?;
        Ok(Eip155ChainReference(chain_id))
    }
}

impl TryFrom<ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: ChainId) -> Result<Self, Self::Error> {
        Eip155ChainReference::try_from(&value)
    }
}

/// Error returned when converting a [`ChainId`] to an [`Eip155ChainReference`].
#[derive(Debug, thiserror::Error)]
pub enum Eip155ChainReferenceFormatError {
    /// The chain ID namespace is not `eip155`.
    #[error("Invalid namespace {0}, expected eip155")]
    InvalidNamespace(String),
    /// The chain reference is not a valid numeric value.
    #[error("Invalid eip155 chain reference {0}")]
    InvalidReference(String),
}

impl Display for Eip155ChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Eip155ChainReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_chain_id().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Eip155ChainReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let chain_id = ChainId::deserialize(deserializer)?;
        Eip155ChainReference::try_from(chain_id).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_chain_reference_from_chain_id() {
        let chain_id = ChainId::new("eip155", "31337");
        let reference = Eip155ChainReference::try_from(&chain_id).unwrap();
        assert_eq!(reference.inner(), 31337);
        assert_eq!(ChainId::from(reference), chain_id);
    }

    #[test]
    fn test_chain_reference_wrong_namespace() {
        let chain_id = ChainId::new("solana", "31337");
        let result = Eip155ChainReference::try_from(chain_id);
        assert!(matches!(
            result,
            Err(Eip155ChainReferenceFormatError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_chain_reference_non_numeric() {
        let chain_id = ChainId::new("eip155", "base");
        let result = Eip155ChainReference::try_from(chain_id);
        assert!(matches!(
            result,
            Err(Eip155ChainReferenceFormatError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_chain_reference_serde() {
        let json = serde_json::to_string(&Eip155ChainReference::new(1)).unwrap();
        assert_eq!(json, "\"eip155:1\"");
        let back: Eip155ChainReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back.inner(), 1);
    }

    #[test]
    fn test_decimal_u256() {
        #[derive(Serialize, Deserialize)]
        struct Amount {
            #[serde(with = "decimal_u256")]
            value: U256,
        }
        let json = serde_json::to_string(&Amount {
            value: U256::from(1_000_000u64),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":"1000000"}"#);
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, U256::from(1_000_000u64));
        assert!(serde_json::from_str::<Amount>(r#"{"value":"0x10"}"#).is_err());
    }
}
