use std::net::SocketAddr;

use serde::Deserialize;
use irismon_core::error::{MonError, Result};

use crate::obs::FEATURE_NAMES;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub simulation: SimulationSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            exporter: ExporterSection::default(),
            simulation: SimulationSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MonError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.exporter.validate()?;
        self.simulation.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.metrics_path.starts_with('/') || self.metrics_path.len() < 2 {
            return Err(MonError::Config(
                "exporter.metrics_path must start with '/' and name a path".into(),
            ));
        }
        if self.metrics_path == "/healthz" {
            return Err(MonError::Config(
                "exporter.metrics_path must not shadow /healthz".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            MonError::Config(format!("exporter.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}

/// Half-open sampling range `[min, max)`, written as `[min, max]` in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SampleRange(pub f64, pub f64);

impl SampleRange {
    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    fn validate(&self, field: &str) -> Result<()> {
        // The width must be finite too, or sampling overflows.
        if !self.0.is_finite()
            || !self.1.is_finite()
            || self.0 >= self.1
            || !(self.1 - self.0).is_finite()
        {
            return Err(MonError::Config(format!(
                "{field} must be finite with min < max and a finite width (got [{}, {}])",
                self.0, self.1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_latency")]
    pub latency_seconds: SampleRange,

    #[serde(default)]
    pub confidence: ConfidenceRanges,

    #[serde(default)]
    pub features: FeatureRanges,

    #[serde(default = "default_memory")]
    pub memory_percent: SampleRange,

    #[serde(default = "default_cpu")]
    pub cpu_percent: SampleRange,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            seed: None,
            latency_seconds: default_latency(),
            confidence: ConfidenceRanges::default(),
            features: FeatureRanges::default(),
            memory_percent: default_memory(),
            cpu_percent: default_cpu(),
        }
    }
}

impl SimulationSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=3_600_000).contains(&self.interval_ms) {
            return Err(MonError::Config(
                "simulation.interval_ms must be between 10 and 3600000".into(),
            ));
        }
        self.latency_seconds.validate("simulation.latency_seconds")?;
        self.confidence.predicted.validate("simulation.confidence.predicted")?;
        self.confidence.other.validate("simulation.confidence.other")?;
        for (name, range) in self.features.ranges() {
            range.validate(&format!("simulation.features.{name}"))?;
        }
        self.memory_percent.validate("simulation.memory_percent")?;
        self.cpu_percent.validate("simulation.cpu_percent")?;
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    1000
}
fn default_latency() -> SampleRange {
    SampleRange(0.01, 0.1)
}
fn default_memory() -> SampleRange {
    SampleRange(40.0, 90.0)
}
fn default_cpu() -> SampleRange {
    SampleRange(10.0, 80.0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfidenceRanges {
    /// Range for the class picked as the prediction.
    #[serde(default = "default_predicted")]
    pub predicted: SampleRange,
    /// Range for every other class.
    #[serde(default = "default_other")]
    pub other: SampleRange,
}

impl Default for ConfidenceRanges {
    fn default() -> Self {
        Self {
            predicted: default_predicted(),
            other: default_other(),
        }
    }
}

fn default_predicted() -> SampleRange {
    SampleRange(0.0, 1.0)
}
fn default_other() -> SampleRange {
    SampleRange(0.0, 0.5)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRanges {
    #[serde(default = "default_sepal_length")]
    pub sepal_length: SampleRange,
    #[serde(default = "default_sepal_width")]
    pub sepal_width: SampleRange,
    #[serde(default = "default_petal_length")]
    pub petal_length: SampleRange,
    #[serde(default = "default_petal_width")]
    pub petal_width: SampleRange,
}

impl Default for FeatureRanges {
    fn default() -> Self {
        Self {
            sepal_length: default_sepal_length(),
            sepal_width: default_sepal_width(),
            petal_length: default_petal_length(),
            petal_width: default_petal_width(),
        }
    }
}

impl FeatureRanges {
    /// `(feature label, range)` in exposition order.
    pub fn ranges(&self) -> [(&'static str, SampleRange); 4] {
        let [sl, sw, pl, pw] = FEATURE_NAMES;
        [
            (sl, self.sepal_length),
            (sw, self.sepal_width),
            (pl, self.petal_length),
            (pw, self.petal_width),
        ]
    }
}

fn default_sepal_length() -> SampleRange {
    SampleRange(4.5, 7.5)
}
fn default_sepal_width() -> SampleRange {
    SampleRange(2.0, 4.0)
}
fn default_petal_length() -> SampleRange {
    SampleRange(1.0, 6.5)
}
fn default_petal_width() -> SampleRange {
    SampleRange(0.1, 2.5)
}
