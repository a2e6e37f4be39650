//! Core types shared by the payment channel crates.
//!
//! This crate holds everything that is independent of how a payment authorization
//! is signed: time, chain identification, configuration helpers, and the custody
//! interface through which channels lock and release funds.
//!
//! # Modules
//!
//! - [`chain`] - CAIP-2 chain identifiers.
//! - [`config`] - Configuration helpers, including environment variable resolution.
//! - [`custody`] - The [`Custody`](custody::Custody) interface and an in-memory [`Ledger`](custody::Ledger).
//! - [`timestamp`] - Unix timestamps used for channel expiration.

pub mod chain;
pub mod config;
pub mod custody;
pub mod timestamp;
