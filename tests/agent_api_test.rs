//! HTTP-level tests for the agent API client, run against a wiremock server
//! with the production reqwest adapter.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use takeoff::error::StreamError;
use takeoff::models::EstimateRequest;
use takeoff::stream::{EventKind, StreamingEstimateService};

const NDJSON_BODY: &str = concat!(
    "{\"type\":\"stream_start\"}\n",
    "{\"type\":\"ai_chunk\",\"data\":\"<action>+ description='Site Clearing', quantity=1, unit_price=1500, amount=1500</action>\"}\n",
    "\n",
    "{\"type\":\"project_created\",\"projectId\":\"proj-wire-1\"}\n",
    "{\"type\":\"complete\"}\n",
);

#[tokio::test]
async fn stream_endpoint_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/stream"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(NDJSON_BODY, "application/x-ndjson"))
        .expect(1)
        .mount(&server)
        .await;

    let service = StreamingEstimateService::with_base_url(server.uri());

    let chunks = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&chunks);
    service.on(EventKind::AiChunk, move |event| {
        if let Some(text) = event.text() {
            sink.lock().unwrap().push(text.to_string());
        }
    });

    let request = EstimateRequest::new("clear the site").with_default_structure();
    let project_id = service
        .start_streaming(&request, "test-token")
        .await
        .unwrap();

    assert_eq!(project_id.as_deref(), Some("proj-wire-1"));
    let chunks = chunks.lock().unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].contains("Site Clearing"));
}

#[tokio::test]
async fn stream_endpoint_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let service = StreamingEstimateService::with_base_url(server.uri());
    let request = EstimateRequest::new("anything");
    let result = service.start_streaming(&request, "test-token").await;

    match result {
        Err(StreamError::HttpStatus { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected HttpStatus error, got {:?}", other),
    }
    assert!(!service.is_streaming());
}

#[tokio::test]
async fn prompt_endpoint_returns_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/prompt"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({ "description": "quick question" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "answer": "about $4,200" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = StreamingEstimateService::with_base_url(server.uri());
    let request = EstimateRequest::new("quick question");
    let response = service.prompt(&request, "test-token").await.unwrap();

    assert_eq!(response["answer"], "about $4,200");
}

#[tokio::test]
async fn prompt_endpoint_propagates_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/prompt"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let service = StreamingEstimateService::with_base_url(server.uri());
    let request = EstimateRequest::new("anything");
    let result = service.prompt(&request, "stale-token").await;

    match result {
        Err(StreamError::HttpStatus { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "token expired");
        }
        other => panic!("expected HttpStatus error, got {:?}", other),
    }
}
