//! Payment channel devnet HTTP entrypoint.
//!
//! Endpoints:
//! - `GET /domain` - Chain id, factory address and EIP-712 domain name/version
//! - `POST /channels` - Create a channel, locking the sender's funds
//! - `GET /channels/{address}` - Inspect an open channel
//! - `POST /channels/{address}/close` - Redeem a signed payment as the receiver
//! - `POST /channels/{address}/cancel` - Reclaim an expired channel as the sender
//! - `POST /approvals` - Approve or revoke the factory as a token operator
//! - `GET /balances/{holder}` - Custody balance of an account
//! - `GET /events` - The factory event log
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `HOST`, `PORT` control binding address
//! - `CONFIG` points at the JSON configuration file
//! - `RUST_LOG` filters log output
//! - `OTEL_*` variables enable OTLP export with the `telemetry` feature

use std::process;

use paychan_host::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
