//! The EIP-712 domain and message type of payment authorizations.
//!
//! A sender authorizes a payout by signing `Payment(uint256 amount)` under the domain
//! `(name = "PaymentChannel", version = "1.0.0", chainId, verifyingContract = channel)`.
//! Binding the channel address into the domain is what keeps a signature issued for
//! one channel from being replayed against another.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use serde::{Deserialize, Serialize};

use crate::chain::Eip155ChainReference;

/// EIP-712 domain name shared by every channel.
pub const PAYMENT_CHANNEL_NAME: &str = "PaymentChannel";
/// EIP-712 domain version shared by every channel.
pub const PAYMENT_CHANNEL_VERSION: &str = "1.0.0";

sol! {
    /// Solidity-compatible struct definition of a payment authorization.
    ///
    /// The EIP-712 type string is `Payment(uint256 amount)`.
    #[derive(Debug, PartialEq, Eq)]
    struct Payment {
        uint256 amount;
    }
}

/// Parameters of an EIP-712 domain as exchanged with off-chain signers.
///
/// Channels always verify against [`PaymentChannelDomain::for_channel`]. The `with_*`
/// builders exist so clients and tests can produce signatures under a different
/// domain, which a channel must then refuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChannelDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PaymentChannelDomain {
    /// The domain a channel at `channel` on `chain` accepts signatures under.
    pub fn for_channel(chain: Eip155ChainReference, channel: Address) -> Self {
        Self {
            name: PAYMENT_CHANNEL_NAME.to_string(),
            version: PAYMENT_CHANNEL_VERSION.to_string(),
            chain_id: chain.inner(),
            verifying_contract: channel,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_verifying_contract(mut self, verifying_contract: Address) -> Self {
        self.verifying_contract = verifying_contract;
        self
    }

    pub fn eip712_domain(&self) -> Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }

    /// The EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        self.eip712_domain().separator()
    }

    /// `keccak256("\x19\x01" || domainSeparator || hashStruct(Payment { amount }))`.
    pub fn signing_hash(&self, amount: U256) -> B256 {
        Payment { amount }.eip712_signing_hash(&self.eip712_domain())
    }
}
