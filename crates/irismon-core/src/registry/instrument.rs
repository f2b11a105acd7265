//! Instrument descriptors and per-series state.
//!
//! An instrument owns its series in a `DashMap` keyed by label values in
//! declaration order. Every write goes through the shard lock of that entry, so
//! a single series is always updated atomically (count, sum and buckets of a
//! histogram move together).

use dashmap::DashMap;

use crate::error::{MonError, Result};

use super::MetricKind;

/// Client-library default histogram buckets.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Immutable declaration of an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    pub name: String,
    pub kind: MetricKind,
    pub help: String,
    pub label_names: Vec<String>,
    /// Finite upper bounds, strictly increasing. Empty unless `kind` is Histogram.
    pub buckets: Vec<f64>,
}

impl Desc {
    pub(crate) fn new(
        name: &str,
        kind: MetricKind,
        help: &str,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> Result<Self> {
        validate_metric_name(name)?;
        for (i, l) in label_names.iter().enumerate() {
            validate_label_name(name, kind, l)?;
            if label_names[..i].contains(l) {
                return Err(MonError::InvalidName(format!(
                    "duplicate label {l} on {name}"
                )));
            }
        }
        if kind == MetricKind::Histogram {
            validate_buckets(name, &buckets)?;
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            help: help.to_string(),
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
            buckets,
        })
    }
}

/// Current state of one series.
///
/// Histogram `bucket_counts` are per bucket (not cumulative) and carry one
/// extra trailing slot for the implicit `+Inf` bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Counter(f64),
    Gauge(f64),
    Histogram {
        bucket_counts: Vec<u64>,
        sum: f64,
        count: u64,
    },
    Summary {
        sum: f64,
        count: u64,
    },
}

impl SampleValue {
    fn zero(desc: &Desc) -> Self {
        match desc.kind {
            MetricKind::Counter => SampleValue::Counter(0.0),
            MetricKind::Gauge => SampleValue::Gauge(0.0),
            MetricKind::Histogram => SampleValue::Histogram {
                bucket_counts: vec![0; desc.buckets.len() + 1],
                sum: 0.0,
                count: 0,
            },
            MetricKind::Summary => SampleValue::Summary { sum: 0.0, count: 0 },
        }
    }

    /// Scalar value for counters and gauges.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Counter(v) | SampleValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// `(sum, count)` for histograms and summaries.
    pub fn sum_count(&self) -> Option<(f64, u64)> {
        match self {
            SampleValue::Histogram { sum, count, .. } | SampleValue::Summary { sum, count } => {
                Some((*sum, *count))
            }
            _ => None,
        }
    }
}

pub(crate) struct Instrument {
    pub(crate) desc: Desc,
    series: DashMap<Vec<String>, SampleValue>,
}

impl Instrument {
    pub(crate) fn new(desc: Desc) -> Self {
        let series = DashMap::new();
        // Unlabelled instruments expose a zero sample before the first write.
        if desc.label_names.is_empty() {
            series.insert(Vec::new(), SampleValue::zero(&desc));
        }
        Self { desc, series }
    }

    /// Resolve `labels` into values ordered like the declared label names.
    /// The key set must match the declaration exactly.
    fn label_key(&self, labels: &[(&str, &str)]) -> Result<Vec<String>> {
        let names = &self.desc.label_names;
        let mismatch = || MonError::InvalidLabels {
            name: self.desc.name.clone(),
            expected: names.clone(),
            got: labels.iter().map(|(k, _)| k.to_string()).collect(),
        };

        if labels.len() != names.len() {
            return Err(mismatch());
        }
        names
            .iter()
            .map(|n| {
                labels
                    .iter()
                    .find(|(k, _)| *k == n.as_str())
                    .map(|(_, v)| v.to_string())
                    .ok_or_else(mismatch)
            })
            .collect()
    }

    /// Apply `f` to the series for `labels`, creating it on first write.
    pub(crate) fn update(&self, labels: &[(&str, &str)], f: impl FnOnce(&mut SampleValue)) -> Result<()> {
        let key = self.label_key(labels)?;
        let mut entry = self
            .series
            .entry(key)
            .or_insert_with(|| SampleValue::zero(&self.desc));
        f(entry.value_mut());
        Ok(())
    }

    /// Copy out every series, sorted by label values.
    pub(crate) fn collect(&self) -> Vec<(Vec<String>, SampleValue)> {
        let mut out: Vec<_> = self
            .series
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Index of the bucket that takes `v`: the smallest bound `>= v`, or the
/// trailing `+Inf` slot when `v` exceeds every bound.
pub(crate) fn bucket_index(bounds: &[f64], v: f64) -> usize {
    bounds.partition_point(|b| *b < v)
}

fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(MonError::InvalidName(format!("metric name {name:?}")))
    }
}

fn validate_label_name(metric: &str, kind: MetricKind, label: &str) -> Result<()> {
    let mut chars = label.chars();
    let well_formed = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    let reserved = label.starts_with("__")
        || (kind == MetricKind::Histogram && label == "le")
        || (kind == MetricKind::Summary && label == "quantile");

    if well_formed && !reserved {
        Ok(())
    } else {
        Err(MonError::InvalidName(format!(
            "label name {label:?} on {metric}"
        )))
    }
}

fn validate_buckets(name: &str, buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(MonError::InvalidBuckets {
            name: name.to_string(),
            reason: "at least one bucket is required",
        });
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(MonError::InvalidBuckets {
            name: name.to_string(),
            reason: "bounds must be finite (+Inf is implicit)",
        });
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(MonError::InvalidBuckets {
            name: name.to_string(),
            reason: "bounds must be strictly increasing",
        });
    }
    Ok(())
}
