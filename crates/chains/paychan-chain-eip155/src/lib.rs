//! EIP-155 (EVM) payment channels.
//!
//! A sender locks funds with a receiver for a bounded duration. The receiver redeems
//! up to the locked amount by presenting one EIP-712 signature from the sender; the
//! remainder goes back to the sender. If the channel expires unredeemed, the sender
//! reclaims everything.
//!
//! # Architecture
//!
//! - [`chain`] - EVM chain references and wire format helpers
//! - [`domain`] - The EIP-712 domain and `Payment` struct every authorization is bound to
//! - [`verifier`] - Signature parsing and signer recovery
//! - [`client`] - Off-chain signing of payment authorizations
//! - [`channel`] - The per-agreement state machine
//! - [`factory`] - Channel creation, the channel table and the event log
//!
//! # Example
//!
//! ```ignore
//! use paychan_chain_eip155::{CallContext, PaymentChannelsFactory};
//! use paychan_chain_eip155::chain::Eip155ChainReference;
//! use paychan_chain_eip155::client::sign_payment_sync;
//! use paychan_types::custody::{AssetRef, Ledger};
//!
//! let mut ledger = Ledger::new();
//! let mut factory = PaymentChannelsFactory::new(factory_address, Eip155ChainReference::new(31337));
//!
//! let channel = factory.create_channel(
//!     &CallContext::new(sender.address(), now),
//!     receiver.address(),
//!     3600,
//!     AssetRef::Native,
//!     U256::from(100),
//!     &mut ledger,
//! )?;
//!
//! // Off-chain: the sender authorizes 60 of the 100 locked.
//! let domain = factory.channel(channel)?.domain();
//! let signature = sign_payment_sync(&sender, &domain, U256::from(60))?;
//!
//! // On-chain: the receiver redeems it.
//! factory.close(&CallContext::new(receiver.address(), now), channel, U256::from(60), &signature, &mut ledger)?;
//! ```

pub mod chain;
pub mod channel;
pub mod client;
pub mod domain;
pub mod error;
pub mod factory;
pub mod verifier;

pub use channel::{CallContext, ChannelState, ChannelTerms, PaymentChannel, Settlement};
pub use domain::PaymentChannelDomain;
pub use error::ChannelError;
pub use factory::{ChannelEvent, PaymentChannelsFactory};
