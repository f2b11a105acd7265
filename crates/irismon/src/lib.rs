//! Top-level facade crate for irismon.
//!
//! Re-exports the registry core and the exporter library so users can depend on a single crate.

pub mod core {
    pub use irismon_core::*;
}

pub mod exporter {
    pub use irismon_exporter::*;
}
