//! Off-chain signing of payment authorizations.
//!
//! The sender signs `Payment { amount }` under the channel's domain and hands the
//! resulting bytes to the receiver, who later presents them to `close`.
//!
//! ```ignore
//! let domain = PaymentChannelDomain::for_channel(chain, channel);
//! let signature = sign_payment(&sender, &domain, U256::from(60)).await?;
//! ```

use alloy_primitives::{Address, B256, Bytes, Signature, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::PaymentChannelDomain;

/// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, and `PrivateKeySigner`
/// is commonly shared between tasks.
#[async_trait]
pub trait SignerLike {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the given hash.
    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Signs an authorization for `amount` under `domain`, returning the 65-byte encoding.
pub async fn sign_payment<S: SignerLike + Sync>(
    signer: &S,
    domain: &PaymentChannelDomain,
    amount: U256,
) -> Result<Bytes, alloy_signer::Error> {
    let hash = domain.signing_hash(amount);
    let signature = signer.sign_hash(&hash).await?;
    tracing::debug!(signer = %signer.address(), %amount, channel = %domain.verifying_contract, "Signed payment");
    Ok(signature.as_bytes().into())
}

/// Blocking counterpart of [`sign_payment`].
pub fn sign_payment_sync<S: SignerSync>(
    signer: &S,
    domain: &PaymentChannelDomain,
    amount: U256,
) -> Result<Bytes, alloy_signer::Error> {
    let hash = domain.signing_hash(amount);
    let signature = signer.sign_hash_sync(&hash)?;
    Ok(signature.as_bytes().into())
}
