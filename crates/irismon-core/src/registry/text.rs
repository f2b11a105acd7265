//! Prometheus text exposition format, version 0.0.4.

use std::fmt::Write;

use super::{FamilySnapshot, RegistrySnapshot, SampleValue};

/// Content type for scrape responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest round-trip decimal, with the exposition spellings for
/// infinities and NaN.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

/// `{a="x",b="y"}`, or an empty string when there are no labels.
fn label_block(labels: &[(String, String)], extra: Option<(&str, &str)>) -> String {
    let mut parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some((k, v)) = extra {
        parts.push(format!("{}=\"{}\"", k, escape_label(v)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn render_family(fam: &FamilySnapshot, out: &mut String) {
    let name = &fam.desc.name;
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(&fam.desc.help));
    let _ = writeln!(out, "# TYPE {} {}", name, fam.desc.kind);

    for s in &fam.series {
        let labels = label_block(&s.labels, None);
        match &s.value {
            SampleValue::Counter(v) | SampleValue::Gauge(v) => {
                let _ = writeln!(out, "{}{} {}", name, labels, format_value(*v));
            }
            SampleValue::Histogram {
                bucket_counts,
                sum,
                count,
            } => {
                // Stored per bucket; exposed cumulatively.
                let mut cumulative = 0u64;
                for (le, n) in fam.desc.buckets.iter().zip(bucket_counts) {
                    cumulative += n;
                    let le = format_value(*le);
                    let _ = writeln!(
                        out,
                        "{}_bucket{} {}",
                        name,
                        label_block(&s.labels, Some(("le", le.as_str()))),
                        cumulative
                    );
                }
                let _ = writeln!(
                    out,
                    "{}_bucket{} {}",
                    name,
                    label_block(&s.labels, Some(("le", "+Inf"))),
                    count
                );
                let _ = writeln!(out, "{}_sum{} {}", name, labels, format_value(*sum));
                let _ = writeln!(out, "{}_count{} {}", name, labels, count);
            }
            SampleValue::Summary { sum, count } => {
                let _ = writeln!(out, "{}_sum{} {}", name, labels, format_value(*sum));
                let _ = writeln!(out, "{}_count{} {}", name, labels, count);
            }
        }
    }
}

impl RegistrySnapshot {
    /// Render every family in registration order.
    pub fn encode_text(&self) -> String {
        let mut out = String::new();
        for fam in self.families() {
            render_family(fam, &mut out);
        }
        out
    }
}
