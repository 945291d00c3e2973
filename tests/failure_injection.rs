//! Failure injection tests: store outages and a failing dependency.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use metrics_gate::resilience::CircuitState;

mod common;

#[tokio::test]
async fn test_store_outage_fails_closed() {
    let server = common::start_server(
        common::test_config(),
        Some(Arc::new(common::DownStore)),
        common::ScriptedDependency::healthy(),
    )
    .await;
    let client = common::client();

    let res = client
        .post(server.url("/api/metrics"))
        .json(&common::metric_body("cpu_usage", 50.0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    assert!(server.service.metric_store().is_empty());

    let res = client
        .get(server.url("/api/metrics/summary?type=cpu_usage&period=any"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    // Health never fails; it reports the outage instead.
    let res = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "unhealthy");
}

#[tokio::test]
async fn test_breaker_opens_and_recovers() {
    let mut config = common::test_config();
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.reset_timeout_secs = 10;
    config.cache.default_ttl_secs = 1;

    let dep = common::ScriptedDependency::failing();
    let server = common::start_server(config, None, dep.clone()).await;
    let client = common::client();

    let summary = |period: &'static str| {
        let client = client.clone();
        let url = server.url(&format!("/api/metrics/summary?type=cpu_usage&period={period}"));
        async move {
            let res = client.get(url).send().await.unwrap();
            assert_eq!(res.status(), 200);
            res.json::<Value>().await.unwrap()
        }
    };

    // Failures below and at the threshold surface the error fallback.
    for period in ["p1", "p2"] {
        let body = summary(period).await;
        assert_eq!(body["external_data"]["status"], "error");
        assert_eq!(body["external_data"]["message"], "External service failed");
    }
    assert_eq!(server.service.breaker().state(), CircuitState::Open);

    // Open: the dependency is not called at all.
    let body = summary("p3").await;
    assert_eq!(body["external_data"]["status"], "fallback");
    assert_eq!(
        body["external_data"]["message"],
        "External service temporarily unavailable"
    );
    assert_eq!(dep.calls(), 2);

    // After the reset timeout a single trial succeeds and closes the breaker.
    dep.set_failing(false);
    server.clock.advance(Duration::from_secs(11));
    let body = summary("p4").await;
    assert_eq!(body["external_data"]["status"], "success");
    assert_eq!(server.service.breaker().state(), CircuitState::Closed);
    assert_eq!(dep.calls(), 3);
}

#[tokio::test]
async fn test_fallback_summary_is_cached() {
    let dep = common::ScriptedDependency::failing();
    let server = common::start_server(common::test_config(), None, dep.clone()).await;
    let client = common::client();
    let url = server.url("/api/metrics/summary?type=mem&period=any");

    let first: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    dep.set_failing(false);
    let second: Value = client.get(&url).send().await.unwrap().json().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second["external_data"]["status"], "error");
    assert_eq!(dep.calls(), 1);
}
