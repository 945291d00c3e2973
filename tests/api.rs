//! End-to-end tests of the HTTP API over a real socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use metrics_gate::http::HttpServer;

mod common;

#[tokio::test]
async fn test_health_reports_store() {
    let server = common::start_server(common::test_config(), None, common::ScriptedDependency::healthy()).await;

    let res = common::client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "healthy");
}

#[tokio::test]
async fn test_ingest_then_summary() {
    let dep = common::ScriptedDependency::healthy();
    let server = common::start_server(common::test_config(), None, dep.clone()).await;
    let client = common::client();

    let res = client
        .post(server.url("/api/metrics"))
        .json(&common::metric_body("cpu_usage", 85.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Metric received successfully");

    let res = client
        .get(server.url("/api/metrics/summary?type=cpu_usage&period=any"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "cpu_usage");
    assert_eq!(body["period"], "any");
    assert_eq!(body["average_value"], 85.5);
    assert_eq!(body["count"], 1);
    assert_eq!(body["external_data"]["status"], "success");
    assert_eq!(dep.calls(), 1);
}

#[tokio::test]
async fn test_summary_for_unknown_type_is_empty() {
    let server = common::start_server(common::test_config(), None, common::ScriptedDependency::healthy()).await;

    let res = common::client()
        .get(server.url("/api/metrics/summary?type=disk&period=1h"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(body["average_value"], 0.0);
}

#[tokio::test]
async fn test_summary_without_query_is_bad_request() {
    let mut config = common::test_config();
    config.rate_limit.threshold = 1;
    let dep = common::ScriptedDependency::healthy();
    let server = common::start_server(config, None, dep.clone()).await;
    let client = common::client();

    for query in ["", "?type=cpu_usage", "?period=any"] {
        let res = client
            .get(server.url(&format!("/api/metrics/summary{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "query {query:?}");
    }
    assert_eq!(dep.calls(), 0);

    // Rejected requests did not use up the single-request budget.
    let res = client
        .get(server.url("/api/metrics/summary?type=cpu_usage&period=any"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(server.url("/api/metrics/summary?type=cpu_usage&period=any"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
}

#[tokio::test]
async fn test_rate_limit_returns_retry_after() {
    let mut config = common::test_config();
    config.rate_limit.threshold = 2;
    let server = common::start_server(config, None, common::ScriptedDependency::healthy()).await;
    let client = common::client();

    for _ in 0..2 {
        let res = client
            .post(server.url("/api/metrics"))
            .header("x-forwarded-for", "203.0.113.5")
            .json(&common::metric_body("cpu_usage", 1.0))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    let res = client
        .post(server.url("/api/metrics"))
        .header("x-forwarded-for", "203.0.113.5")
        .json(&common::metric_body("cpu_usage", 1.0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(res.headers()["retry-after"], "60");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too Many Requests");

    // Another client has its own budget.
    let res = client
        .post(server.url("/api/metrics"))
        .header("x-forwarded-for", "203.0.113.6")
        .json(&common::metric_body("cpu_usage", 1.0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    // The next window admits the first client again.
    server.clock.advance(std::time::Duration::from_secs(60));
    let res = client
        .post(server.url("/api/metrics"))
        .header("x-forwarded-for", "203.0.113.5")
        .json(&common::metric_body("cpu_usage", 1.0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(server.service.metric_store().len(), 4);
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let server = common::start_server(common::test_config(), None, common::ScriptedDependency::healthy()).await;
    let client = common::client();

    let res = client.get(server.url("/health")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let res = client
        .get(server.url("/health"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-abc");
}

#[tokio::test]
async fn test_invalid_metric_body_is_rejected() {
    let server = common::start_server(common::test_config(), None, common::ScriptedDependency::healthy()).await;

    let res = common::client()
        .post(server.url("/api/metrics"))
        .json(&serde_json::json!({"value": "high", "type": "cpu_usage"}))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());
    assert!(server.service.metric_store().is_empty());
}

#[tokio::test]
async fn test_unresolved_identity_is_bad_request() {
    let config = common::test_config();
    let (service, _) = common::build_service(&config, None, common::ScriptedDependency::healthy());
    let router = HttpServer::new(&config.server, service.clone()).router();

    // No connection info and no forwarding header.
    let request = Request::builder()
        .method("POST")
        .uri("/api/metrics")
        .header("content-type", "application/json")
        .body(Body::from(common::metric_body("cpu_usage", 1.0).to_string()))
        .unwrap();

    let res = router.oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(service.metric_store().is_empty());
}
