#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use irismon_core::registry::{MetricKind, Registry};
use irismon_exporter::{app_state::AppState, config, server};

struct Running {
    addr: std::net::SocketAddr,
    stop: oneshot::Sender<()>,
    join: tokio::task::JoinHandle<irismon_core::Result<()>>,
}

async fn start(state: AppState) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, rx) = oneshot::channel::<()>();
    let join = tokio::spawn(server::serve(listener, state, async move {
        let _ = rx.await;
    }));
    Running { addr, stop, join }
}

/// Minimal HTTP/1.1 GET; returns (status line, headers, body).
async fn get(addr: std::net::SocketAddr, path: &str) -> (String, String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").expect("no header terminator");
    let (status, headers) = head.split_once("\r\n").unwrap_or((head, ""));
    (status.to_string(), headers.to_ascii_lowercase(), body.to_string())
}

#[tokio::test]
async fn scrape_before_any_mutation() {
    let state = AppState::new(config::load_from_str("version: 1\n").unwrap()).unwrap();
    let running = start(state).await;

    let (status, headers, body) = get(running.addr, "/metrics").await;
    assert!(status.starts_with("HTTP/1.1 200"), "{status}");
    assert!(headers.contains("content-type: text/plain; version=0.0.4"));

    for (name, kind) in [
        ("iris_api_requests_total", "counter"),
        ("iris_api_request_latency_seconds", "summary"),
        ("iris_model_predictions_total", "counter"),
        ("iris_model_confidence", "histogram"),
        ("iris_feature_values", "gauge"),
        ("system_memory_usage_percent", "gauge"),
        ("system_cpu_usage_percent", "gauge"),
    ] {
        assert!(body.contains(&format!("# HELP {name} ")), "{name}");
        assert!(body.contains(&format!("# TYPE {name} {kind}\n")), "{name}");
    }
    assert!(body.contains("iris_api_requests_total 0\n"));
    assert!(body.contains("iris_api_request_latency_seconds_count 0\n"));
    assert!(body.contains("system_cpu_usage_percent 0\n"));

    running.stop.send(()).unwrap();
    running.join.await.unwrap().unwrap();
}

#[tokio::test]
async fn scrape_reflects_registry_writes() {
    let registry = Arc::new(Registry::new());
    registry
        .register("requests_total", MetricKind::Counter, "Requests", &[])
        .unwrap();
    let cfg = config::load_from_str("version: 1\nexporter: { metrics_path: \"/scrape\" }\n").unwrap();
    let state = AppState::with_registry(cfg, Arc::clone(&registry)).unwrap();
    let running = start(state).await;

    for _ in 0..5 {
        registry.inc("requests_total", &[]).unwrap();
    }

    let (status, _, body) = get(running.addr, "/scrape").await;
    assert!(status.starts_with("HTTP/1.1 200"));
    assert!(body.contains("\nrequests_total 5\n"), "{body}");

    // Two scrapes without writes in between are identical.
    let (_, _, again) = get(running.addr, "/scrape").await;
    assert_eq!(body, again);

    let (status, _, _) = get(running.addr, "/metrics").await;
    assert!(status.starts_with("HTTP/1.1 404"), "{status}");

    running.stop.send(()).unwrap();
    running.join.await.unwrap().unwrap();
}

#[tokio::test]
async fn healthz_reports_instruments() {
    let state = AppState::new(config::load_from_str("version: 1\n").unwrap()).unwrap();
    let running = start(state).await;

    let (status, _, body) = get(running.addr, "/healthz").await;
    assert!(status.starts_with("HTTP/1.1 200"));
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["instruments"], 7);

    running.stop.send(()).unwrap();
    running.join.await.unwrap().unwrap();
}
