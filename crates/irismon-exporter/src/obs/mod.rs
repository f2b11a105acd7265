//! Instrument catalogue for the simulated Iris model service.
//!
//! Names, help texts, and label sets are declared once here and registered into
//! a caller-owned `Registry` at startup.

pub mod iris;

pub use iris::{register_iris_metrics, IrisClass, FEATURE_NAMES};
