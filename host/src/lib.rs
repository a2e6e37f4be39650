//! Payment channel devnet host.
//!
//! An HTTP server that runs a single [`PaymentChannelsFactory`](paychan_chain_eip155::PaymentChannelsFactory)
//! over an in-memory custody [`Ledger`](paychan_types::custody::Ledger), standing in for
//! a local development chain. Callers assert their own identity in request bodies;
//! there is no authentication.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration types and loading |
//! | [`devnet`] | The factory and ledger behind the server |
//! | [`handlers`] | HTTP routes |
//! | [`run`] | Server initialization and runtime |
//! | [`util`] | Shutdown signals and telemetry |
//!
//! # Running the Server
//!
//! ```bash
//! # Run with default configuration
//! cargo run --package paychan-host
//!
//! # Run with telemetry
//! cargo run --package paychan-host --features telemetry
//!
//! # Run with custom config
//! cargo run --package paychan-host -- --config /path/to/config.json
//! ```

pub mod config;
pub mod devnet;
pub mod handlers;
pub mod run;
pub mod util;

pub use run::run;
