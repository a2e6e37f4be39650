//! Asset custody: the ledger that actually holds and moves value.
//!
//! Channels never hold value themselves. At creation the factory asks custody to
//! [`lock`](Custody::lock) the sender's funds into the channel's escrow account; at
//! settlement the channel asks custody to [`release`](Custody::release) them again.
//! Every implementation must be atomic (an operation either fully applies or leaves
//! every balance untouched) and conserving (value only moves between accounts).
//!
//! [`Ledger`] is an in-memory implementation used by the devnet host and by tests.

mod ledger;

pub use ledger::*;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Reference to the denomination locked in a channel.
///
/// # Serialization
///
/// - Native currency: `"native"`
/// - Multi-token (ERC-1155 style) denomination: `"<contract>:<decimal id>"`
///
/// ```
/// use paychan_types::custody::AssetRef;
///
/// let native: AssetRef = "native".parse().unwrap();
/// assert_eq!(native, AssetRef::Native);
///
/// let token: AssetRef = "0x5FbDB2315678afecb367f032d93F642f64180aa3:7".parse().unwrap();
/// assert_eq!(token.to_string(), "0x5FbDB2315678afecb367f032d93F642f64180aa3:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// The execution environment's native currency.
    Native,
    /// A token `id` issued by the multi-token `contract`.
    Token { contract: Address, id: U256 },
}

impl AssetRef {
    pub fn token(contract: Address, id: U256) -> Self {
        AssetRef::Token { contract, id }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetRef::Native)
    }
}

impl Display for AssetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetRef::Native => f.write_str("native"),
            AssetRef::Token { contract, id } => {
                write!(f, "{}:{}", contract.to_checksum(None), id)
            }
        }
    }
}

/// Error returned when parsing an invalid [`AssetRef`] string.
#[derive(Debug, thiserror::Error)]
#[error("Invalid asset reference {0}, expected `native` or `<contract>:<id>`")]
pub struct AssetRefFormatError(String);

impl FromStr for AssetRef {
    type Err = AssetRefFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(AssetRef::Native);
        }
        let (contract, id) = s
            .split_once(':')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| AssetRefFormatError(s.into()))?;
        let contract = Address::from_str(contract).map_err(|_| AssetRefFormatError(s.into()))?;
        let id = U256::from_str_radix(id, 10).map_err(|_| AssetRefFormatError(s.into()))?;
        Ok(AssetRef::Token { contract, id })
    }
}

impl Serialize for AssetRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Failures reported by a custody backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustodyError {
    #[error("Insufficient balance for transfer: {holder} holds {available} of {asset}, {required} required")]
    InsufficientBalance {
        holder: Address,
        asset: AssetRef,
        available: U256,
        required: U256,
    },
    #[error("Operator {operator} is not approved by {owner}")]
    NotApproved { owner: Address, operator: Address },
    #[error("Balance overflow crediting {holder}")]
    Overflow { holder: Address },
}

/// The narrow ledger interface consumed by channels and their factory.
pub trait Custody {
    /// Moves `amount` of `asset` from `from` into the `escrow` account, on behalf of `operator`.
    ///
    /// Token denominations require `from` to have approved `operator` beforehand.
    /// Native currency is attached to the call by `from` itself and needs no approval.
    fn lock(
        &mut self,
        operator: Address,
        from: Address,
        escrow: Address,
        asset: &AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError>;

    /// Moves `amount` of `asset` out of the `escrow` account to `to`.
    fn release(
        &mut self,
        escrow: Address,
        to: Address,
        asset: &AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError>;

    /// Returns the balance of `holder` in `asset`.
    fn balance_of(&self, holder: Address, asset: &AssetRef) -> U256;
}
