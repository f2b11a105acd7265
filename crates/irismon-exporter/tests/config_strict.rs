#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use irismon_exporter::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
simulation:
  interval_ms: 1000
  featurez: { sepal_length: [4.5, 7.5] } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.exporter.listen, "0.0.0.0:8000");
    assert_eq!(cfg.exporter.metrics_path, "/metrics");
    assert_eq!(cfg.simulation.interval_ms, 1000);
    assert_eq!(cfg.simulation.seed, None);
    assert_eq!(cfg.simulation.memory_percent.min(), 40.0);
    assert_eq!(cfg.simulation.features.petal_width.max(), 2.5);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
exporter:
  listen: "127.0.0.1:9100"
  metrics_path: "/scrape"
simulation:
  interval_ms: 250
  seed: 42
  latency_seconds: [0.02, 0.2]
  confidence: { predicted: [0.6, 1.0], other: [0.0, 0.4] }
  features:
    sepal_length: [4, 8]
  memory_percent: [10, 20]
  cpu_percent: [1.5, 2.5]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.exporter.listen_addr().unwrap().port(), 9100);
    assert_eq!(cfg.exporter.metrics_path, "/scrape");
    assert_eq!(cfg.simulation.seed, Some(42));
    assert_eq!(cfg.simulation.confidence.predicted.min(), 0.6);
    assert_eq!(cfg.simulation.features.sepal_length.max(), 8.0);
    // Untouched features keep their defaults.
    assert_eq!(cfg.simulation.features.sepal_width.min(), 2.0);
}

#[test]
fn rejects_bad_values() {
    for bad in [
        "version: 2\n",
        "version: 1\nexporter: { listen: \"not-an-addr\" }\n",
        "version: 1\nexporter: { metrics_path: \"metrics\" }\n",
        "version: 1\nexporter: { metrics_path: \"/healthz\" }\n",
        "version: 1\nsimulation: { interval_ms: 0 }\n",
        "version: 1\nsimulation: { cpu_percent: [80, 10] }\n",
        "version: 1\nsimulation: { latency_seconds: [0.1, 0.1] }\n",
        "version: 1\nsimulation: { latency_seconds: [0.1] }\n",
        "version: 1\nsimulation: { latency_seconds: [-1.0e308, 1.0e308] }\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code(), "CONFIG", "{bad}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("/nonexistent/irismon.yaml").expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}
