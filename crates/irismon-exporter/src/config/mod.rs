//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use irismon_core::error::{MonError, Result};

pub use schema::{
    ConfidenceRanges, ExporterConfig, ExporterSection, FeatureRanges, SampleRange,
    SimulationSection,
};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "irismon.yaml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "IRISMON_CONFIG";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| MonError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| MonError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config: explicit path, then `IRISMON_CONFIG`, then
/// `irismon.yaml` if it exists, else built-in defaults.
pub fn resolve(explicit: Option<&str>) -> Result<ExporterConfig> {
    if let Some(path) = explicit {
        return load_from_file(path);
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_from_file(path);
    }
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return load_from_file(DEFAULT_CONFIG_FILE);
    }
    tracing::info!("no config file found, using defaults");
    let cfg = ExporterConfig::default();
    cfg.validate()?;
    Ok(cfg)
}
