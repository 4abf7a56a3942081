//! Fallback routing and circuit breaker behavior through the HTTP surface

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_llm::MockLlm;
use harness::server::TestServer;

fn completion_body() -> serde_json::Value {
    serde_json::json!({
        "messages": [{"role": "user", "content": "Hello"}],
        "max_tokens": 16
    })
}

#[tokio::test]
async fn primary_serves_without_fallback() {
    let primary = MockLlm::start().await.unwrap();
    let backup = MockLlm::start_with_response("backup response").await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/complete"))
        .json(&completion_body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["provider_used"], "primary");
    assert_eq!(json["fallback_triggered"], false);
    assert_eq!(backup.completion_count(), 0);
}

#[tokio::test]
async fn failed_primary_falls_back_to_backup() {
    let primary = MockLlm::start_failing(1000).await.unwrap();
    let backup = MockLlm::start_with_response("backup response").await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/complete"))
        .json(&completion_body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["provider_used"], "backup");
    assert_eq!(json["content"], "backup response");
    assert_eq!(json["fallback_triggered"], true);
    let reason = json["fallback_reason"].as_str().unwrap();
    assert!(reason.starts_with("primary:"), "unexpected reason: {reason}");
    assert_eq!(primary.completion_count(), 1);
}

#[tokio::test]
async fn open_circuit_stops_hitting_failing_provider() {
    let primary = MockLlm::start_failing(1000).await.unwrap();
    let backup = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .with_circuit_breaker(2, 60)
        .build();
    let server = TestServer::start(&config).await.unwrap();

    // Two failures trip the breaker
    for _ in 0..2 {
        let resp = server
            .client()
            .post(server.url("/v1/complete"))
            .json(&completion_body())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(primary.completion_count(), 2);

    // Third request skips primary entirely
    let resp = server
        .client()
        .post(server.url("/v1/complete"))
        .json(&completion_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["provider_used"], "backup");
    assert_eq!(json["fallback_triggered"], true);
    assert!(
        json["fallback_reason"].as_str().unwrap().contains("circuit breaker open"),
        "expected circuit-open skip"
    );
    assert_eq!(primary.completion_count(), 2);
}

#[tokio::test]
async fn providers_status_reports_breaker_state() {
    let primary = MockLlm::start_failing(1000).await.unwrap();
    let backup = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .with_circuit_breaker(2, 60)
        .build();
    let server = TestServer::start(&config).await.unwrap();

    for _ in 0..2 {
        server
            .client()
            .post(server.url("/v1/complete"))
            .json(&completion_body())
            .send()
            .await
            .unwrap();
    }

    let resp = server
        .client()
        .get(server.url("/v1/providers/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let snapshots = body["providers"].as_array().unwrap();
    assert_eq!(snapshots.len(), 2);

    let primary_snap = snapshots.iter().find(|s| s["provider_id"] == "primary").unwrap();
    assert_eq!(primary_snap["state"], "open");
    assert_eq!(primary_snap["consecutive_failures"], 2);
    assert!(primary_snap["cooldown_until"].is_string());

    let backup_snap = snapshots.iter().find(|s| s["provider_id"] == "backup").unwrap();
    assert_eq!(backup_snap["state"], "closed");
    assert_eq!(backup_snap["consecutive_failures"], 0);
}

#[tokio::test]
async fn exhausted_candidates_return_service_unavailable() {
    let primary = MockLlm::start_failing(1000).await.unwrap();
    let backup = MockLlm::start_failing(1000).await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/complete"))
        .json(&completion_body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["kind"], "all_providers_unavailable");
    let attempts = json["error"]["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["provider"], "primary");
    assert_eq!(attempts[1]["provider"], "backup");
    assert_eq!(primary.completion_count(), 1);
    assert_eq!(backup.completion_count(), 1);
}

#[tokio::test]
async fn permanent_provider_errors_still_fall_back() {
    // 401 from the provider is permanent for that attempt, but the request
    // itself can still be served by the next candidate
    let primary = MockLlm::start_failing_with(1000, axum::http::StatusCode::UNAUTHORIZED)
        .await
        .unwrap();
    let backup = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_openai_provider("primary", &primary.base_url())
        .with_openai_provider("backup", &backup.base_url())
        .with_priority(&["primary", "backup"])
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/complete"))
        .json(&completion_body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["provider_used"], "backup");
    assert!(json["fallback_reason"].as_str().unwrap().contains("401"));
}
