//! Process-level helpers for the host binary.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`sig_down`] | Graceful shutdown signal handling |
//! | [`telemetry`] | Logging setup, optional OpenTelemetry export behind the `telemetry` feature |

pub mod sig_down;
pub mod telemetry;

pub use sig_down::*;
pub use telemetry::*;
