//! Shared error type across irismon crates.

use thiserror::Error;

use crate::registry::MetricKind;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MonError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum MonError {
    #[error("metric {name} already registered as {existing} ({reason})")]
    DuplicateMetric {
        name: String,
        existing: MetricKind,
        reason: &'static str,
    },
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid buckets for {name}: {reason}")]
    InvalidBuckets { name: String, reason: &'static str },
    #[error("invalid labels for {name}: expected {expected:?}, got {got:?}")]
    InvalidLabels {
        name: String,
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: &'static str },
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("metric {name} is a {kind}, cannot {op}")]
    KindMismatch {
        name: String,
        kind: MetricKind,
        op: &'static str,
    },
    #[error("simulation cycle failed: {0}")]
    SimulationCycle(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl MonError {
    /// Stable upper-snake code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            MonError::DuplicateMetric { .. } => "DUPLICATE_METRIC",
            MonError::InvalidName(_) => "INVALID_NAME",
            MonError::InvalidBuckets { .. } => "INVALID_BUCKETS",
            MonError::InvalidLabels { .. } => "INVALID_LABELS",
            MonError::InvalidValue { .. } => "INVALID_VALUE",
            MonError::UnknownMetric(_) => "UNKNOWN_METRIC",
            MonError::KindMismatch { .. } => "KIND_MISMATCH",
            MonError::SimulationCycle(_) => "SIMULATION_CYCLE",
            MonError::Config(_) => "CONFIG",
            MonError::Io(_) => "IO",
        }
    }

    /// True when the error means an instrument was never declared (or was
    /// declared with another kind). Retrying cannot fix these.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            MonError::UnknownMetric(_) | MonError::KindMismatch { .. }
        )
    }
}
