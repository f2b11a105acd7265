//! irismon core: the metrics registry, its snapshots, the text exposition
//! encoder, and the shared error type.
//!
//! This crate carries no HTTP or async runtime dependencies so the registry can
//! be driven from plain threads, tests, or the exporter service alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied outside tests. All
//! fallible paths surface as `MonError`/`Result`.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod registry;

/// Shared result type.
pub use error::{MonError, Result};
pub use registry::{MetricKind, Registry, RegistrySnapshot, SampleValue, TEXT_CONTENT_TYPE};
