//! Chain identification.
//!
//! Channels are bound to exactly one execution context. The context is named by a
//! CAIP-2 [`ChainId`]; chain families (such as `eip155`) narrow it to their own
//! numeric reference type.

mod chain_id;

pub use chain_id::*;
