//! `network-monitor` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod http;
pub mod runner;
pub mod tcp;
pub mod tls;
pub mod uplink;
pub mod ws;
