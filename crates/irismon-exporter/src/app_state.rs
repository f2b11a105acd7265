//! Shared application state for the exporter.
//!
//! Holds the one registry that the simulator writes and every scrape reads.
//! Startup errors (bad config, clashing declarations) come back as `Result`.

use std::sync::Arc;

use irismon_core::error::Result;
use irismon_core::registry::Registry;

use crate::config::ExporterConfig;
use crate::obs::register_iris_metrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<Registry>,
}

struct AppStateInner {
    cfg: ExporterConfig,
}

impl AppState {
    /// Build a fresh registry and declare the Iris instruments in it.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        register_iris_metrics(&registry)?;
        Self::with_registry(cfg, registry)
    }

    /// Serve an existing registry as-is.
    pub fn with_registry(cfg: ExporterConfig, registry: Arc<Registry>) -> Result<Self> {
        cfg.validate()?;
        tracing::debug!(instruments = registry.len(), "app state ready");
        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            registry,
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}
