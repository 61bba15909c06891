//! Runner for the BLE bridge.
//!
//! Provides the pieces behind the `blebridge` binary:
//!
//! - [`BridgeServer`]: a simulated module behind a TCP port
//! - [`run_demo`]: host, module and phone wired together in one process
//! - [`RunnerConfig`]: YAML configuration shared by all subcommands

mod bridge;
mod config;
mod demo;
mod error;

pub use bridge::*;
pub use config::*;
pub use demo::*;
pub use error::*;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `level` overrides `RUST_LOG`; without either, `info` is used.
pub fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    blebridge_module::telemetry::describe_metrics();
    blebridge_host::telemetry::describe_metrics();
}
