//! irismon exporter library entry.
//!
//! Wires the config, the Iris instrument catalogue, the simulation loop, and
//! the scrape endpoint into one service. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod server;
pub mod sim;
