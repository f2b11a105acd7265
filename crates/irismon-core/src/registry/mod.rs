//! In-process metrics registry.
//!
//! Instruments are declared once with a fixed kind and label set, then mutated
//! by name. The registry is an ordinary value: callers share it through an
//! `Arc` instead of a global, so tests can build as many as they like.
//!
//! Rendering lives in [`text`]; readers take a [`RegistrySnapshot`] and encode
//! that, so a scrape never holds a lock across the whole registry.

mod instrument;
mod snapshot;
pub mod text;

use std::fmt;
use std::sync::{Arc, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{MonError, Result};

use instrument::{bucket_index, Instrument};

pub use instrument::{Desc, SampleValue, DEFAULT_BUCKETS};
pub use snapshot::{FamilySnapshot, RegistrySnapshot, SeriesSnapshot};
pub use text::TEXT_CONTENT_TYPE;

/// Instrument kind, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Name used in `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
pub struct Registry {
    index: DashMap<String, Arc<Instrument>>,
    // Registration order, used for rendering.
    order: RwLock<Vec<Arc<Instrument>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an instrument. Histograms get [`DEFAULT_BUCKETS`].
    ///
    /// Registering the exact same declaration twice is a no-op. Any other
    /// reuse of a name fails with [`MonError::DuplicateMetric`].
    pub fn register(
        &self,
        name: &str,
        kind: MetricKind,
        help: &str,
        label_names: &[&str],
    ) -> Result<()> {
        let buckets = match kind {
            MetricKind::Histogram => DEFAULT_BUCKETS.to_vec(),
            _ => Vec::new(),
        };
        self.insert(Desc::new(name, kind, help, label_names, buckets)?)
    }

    /// Declare a histogram with explicit bucket upper bounds.
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<()> {
        self.insert(Desc::new(
            name,
            MetricKind::Histogram,
            help,
            label_names,
            buckets.to_vec(),
        )?)
    }

    fn insert(&self, desc: Desc) -> Result<()> {
        match self.index.entry(desc.name.clone()) {
            Entry::Occupied(e) => {
                let existing = &e.get().desc;
                if *existing == desc {
                    return Ok(());
                }
                let reason = if existing.kind != desc.kind {
                    "kind differs"
                } else if existing.label_names != desc.label_names {
                    "label names differ"
                } else {
                    "declaration differs"
                };
                Err(MonError::DuplicateMetric {
                    name: desc.name,
                    existing: existing.kind,
                    reason,
                })
            }
            Entry::Vacant(v) => {
                tracing::debug!(name = %desc.name, kind = %desc.kind, "metric registered");
                let inst = Arc::new(Instrument::new(desc));
                self.order
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(Arc::clone(&inst));
                v.insert(inst);
                Ok(())
            }
        }
    }

    fn lookup(&self, name: &str, op: &'static str, accepts: &[MetricKind]) -> Result<Arc<Instrument>> {
        let inst = self
            .index
            .get(name)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| MonError::UnknownMetric(name.to_string()))?;
        if !accepts.contains(&inst.desc.kind) {
            return Err(MonError::KindMismatch {
                name: name.to_string(),
                kind: inst.desc.kind,
                op,
            });
        }
        Ok(inst)
    }

    /// Increment a counter by 1.
    pub fn inc(&self, name: &str, labels: &[(&str, &str)]) -> Result<()> {
        self.increment(name, labels, 1.0)
    }

    /// Increment a counter. `amount` must be finite and non-negative.
    pub fn increment(&self, name: &str, labels: &[(&str, &str)], amount: f64) -> Result<()> {
        let inst = self.lookup(name, "increment", &[MetricKind::Counter])?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(MonError::InvalidValue {
                name: name.to_string(),
                reason: "counter increments must be finite and >= 0",
            });
        }
        inst.update(labels, |v| {
            if let SampleValue::Counter(total) = v {
                *total += amount;
            }
        })
    }

    /// Overwrite a gauge.
    pub fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<()> {
        let inst = self.lookup(name, "set", &[MetricKind::Gauge])?;
        inst.update(labels, |v| {
            if let SampleValue::Gauge(g) = v {
                *g = value;
            }
        })
    }

    /// Record one observation into a histogram or summary.
    pub fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<()> {
        let inst = self.lookup(
            name,
            "observe",
            &[MetricKind::Histogram, MetricKind::Summary],
        )?;
        if value.is_nan() {
            return Err(MonError::InvalidValue {
                name: name.to_string(),
                reason: "observation is NaN",
            });
        }
        let bucket = bucket_index(&inst.desc.buckets, value);
        inst.update(labels, |v| match v {
            SampleValue::Histogram {
                bucket_counts,
                sum,
                count,
            } => {
                bucket_counts[bucket] += 1;
                *sum += value;
                *count += 1;
            }
            SampleValue::Summary { sum, count } => {
                *sum += value;
                *count += 1;
            }
            _ => {}
        })
    }

    /// Copy the current state of every instrument.
    ///
    /// Each series is read under its own lock. Writers touching other
    /// instruments are not blocked, so a snapshot may straddle a burst of
    /// updates across instruments.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let order = self.order.read().unwrap_or_else(|e| e.into_inner());
        let families = order
            .iter()
            .map(|inst| FamilySnapshot::new(inst.desc.clone(), inst.collect()))
            .collect();
        RegistrySnapshot::new(families)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
