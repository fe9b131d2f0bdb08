//! HTTP surface tests against a running server.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use flaky_gate::config::AppConfig;

mod common;

fn small_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.endpoint.initial_delay_ms = 5;
    config.endpoint.lock_threshold_ms = 40;
    config.gate.call_timeout_ms = 1_000;
    config.gate.rolling_window_size = 2;
    config.gate.error_threshold_percent = 50;
    config.gate.open_duration_ms = 60_000;
    config
}

#[tokio::test]
async fn test_flaky_route_doubles_then_locks() {
    let (addr, shutdown) = common::start_server(small_config()).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/flaky", addr);

    for expected in [10, 20, 40, 80] {
        let res = client.get(&url).send().await.expect("server unreachable");
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["delay"], expected);
        assert_eq!(body["observed_delay_ms"], expected / 2);
    }

    for _ in 0..3 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 423, "overloaded endpoint should answer 423");
        assert_eq!(res.text().await.unwrap(), "Locked");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_guarded_route_degrades_to_fallback() {
    let mut config = small_config();
    config.endpoint.lock_threshold_ms = 10;
    let (addr, shutdown) = common::start_server(config).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/guarded", addr);

    // 5ms and 10ms are served, then the endpoint locks.
    for expected in [10, 20] {
        let body: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["source"], "live");
        assert_eq!(body["body"]["delay"], expected);
    }

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200, "the gate never surfaces a failure status");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["body"]["fallback"], true);
    assert_eq!(body["body"]["message"], "/api/flaky unavailable right now. Try later.");

    let status: Value = client
        .get(format!("http://{}/api/gate", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["mode"], "open");
    assert_eq!(status["failures"], 1);
    assert_eq!(status["window_size"], 2);

    // Open: rejected without touching the endpoint.
    let body: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["source"], "fallback");

    shutdown.trigger();
}

#[tokio::test]
async fn test_remote_locked_maps_to_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let backend = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (423, "Locked".to_string())
        }
    })
    .await;

    let mut config = small_config();
    config.remote.url = Some(format!("http://{}/api/flaky", backend));
    let (addr, shutdown) = common::start_server(config).await;
    let client = reqwest::Client::new();

    for _ in 0..4 {
        let body: Value = client
            .get(format!("http://{}/api/guarded", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["source"], "fallback");
    }

    // Two failures fill the window and open the gate; the rest are rejected.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_remote_success_passes_body_through() {
    let backend = common::start_programmable_backend(|| async {
        (200, json!({ "delay": 14, "observed_delay_ms": 7 }).to_string())
    })
    .await;

    let mut config = small_config();
    config.remote.url = Some(format!("http://{}/api/flaky", backend));
    let (addr, shutdown) = common::start_server(config).await;

    let body: Value = reqwest::get(format!("http://{}/api/guarded", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "source": "live", "body": { "delay": 14, "observed_delay_ms": 7 } }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_gate_in_front_of_another_instance() {
    let (upstream, upstream_shutdown) = common::start_server(small_config()).await;

    let mut config = small_config();
    config.remote.url = Some(format!("http://{}/api/flaky", upstream));
    let (addr, shutdown) = common::start_server(config).await;

    let body: Value = reqwest::get(format!("http://{}/api/guarded", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "live");
    assert_eq!(body["body"]["delay"], 10);

    shutdown.trigger();
    upstream_shutdown.trigger();
}

#[tokio::test]
async fn test_health_and_request_id() {
    let (addr, shutdown) = common::start_server(small_config()).await;

    let res = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "ok");

    shutdown.trigger();
}
