//! EVM chain types.
//!
//! Channels are bound to one [`Eip155ChainReference`]; the numeric chain id becomes
//! the `chainId` of every EIP-712 domain the channel accepts.

mod types;

pub use types::*;
