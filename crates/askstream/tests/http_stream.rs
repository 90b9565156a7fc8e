//! End-to-end tests of the HTTP client against a mock ask service.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use askstream::prelude::*;
use askstream::TerminalState;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_BODY: &str = "event: classification\n\
data: {\"route\":\"retrieval\",\"rewritten_query\":\"rotate index\",\"confidence\":0.87}\n\
\n\
event: reasoning\n\
data: checking the admin guide\n\
\n\
event: hit\n\
data: {\"id\":\"admin-guide#rotation\"}\n\
\n\
event: answer\n\
data: Use the \n\
\n\
event: answer\n\
data: rotate command.\n\
\n\
event: followup_question\n\
data: How often should I rotate?\n\
\n\
event: done\n\
data: \n\
\n";

fn client_for(server: &MockServer) -> AskClient {
    AskClient::new(ClientConfig::new(server.uri()).api_key("test-key")).expect("client")
}

fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

#[tokio::test]
async fn streamed_ask_negotiates_event_stream_and_builds_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .and(header("accept", "text/event-stream"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "question": "How do I rotate an index?",
            "index": "docs",
            "stream": true
        })))
        .respond_with(event_stream(STREAM_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink = hits.clone();
    let mut callbacks = Callbacks::new().on(EventCategory::Hit, move |hit| {
        sink.lock().expect("lock").push(hit.to_string());
        Ok(())
    });

    let result = client_for(&server)
        .ask("How do I rotate an index?")
        .index("docs")
        .send(&mut callbacks)
        .await
        .expect("result");

    assert_eq!(result.answer, "Use the rotate command.");
    assert_eq!(result.followup_questions, vec!["How often should I rotate?"]);
    assert!(result.completed);
    let classification = result.classification.expect("classification");
    assert_eq!(classification.route, "retrieval");
    assert_eq!(classification.rewritten_query, "rotate index");
    assert_eq!(
        *hits.lock().expect("lock"),
        vec![r#"{"id":"admin-guide#rotation"}"#]
    );
}

#[tokio::test]
async fn non_streamed_ask_decodes_json_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .and(header("accept", "application/json"))
        .and(body_partial_json(serde_json::json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "Use the rotate command.",
            "classification": {"route": "retrieval", "rewritten_query": "rotate", "confidence": 0.5},
            "followup_questions": ["Why rotate?"]
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .ask("How do I rotate an index?")
        .stream(false)
        .collect()
        .await
        .expect("result");

    assert_eq!(result.answer, "Use the rotate command.");
    assert_eq!(result.followup_questions, vec!["Why rotate?"]);
    assert!(result.completed);
}

#[tokio::test]
async fn non_success_status_fails_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(ResponseTemplate::new(404).set_body_string("index not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .ask("q")
        .collect()
        .await
        .expect_err("should fail");
    assert!(matches!(
        err,
        AskError::Status { status: 404, ref body } if body == "index not found"
    ));
}

#[tokio::test]
async fn redirect_status_is_a_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .ask("q")
        .collect()
        .await
        .expect_err("should fail");
    assert!(matches!(err, AskError::Status { status: 304, .. }));
}

#[tokio::test]
async fn error_event_is_returned_without_partial_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(event_stream(
            "event: answer\ndata: partial\n\nevent: error\ndata: boom\n\n",
        ))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .ask("q")
        .collect()
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.terminal_state(), Some(TerminalState::Errored));
}

#[tokio::test]
async fn stream_closed_without_done_returns_partial_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(event_stream("event: answer\ndata: a\n\nevent: answer\ndata: b"))
        .mount(&server)
        .await;

    let result = client_for(&server).ask("q").collect().await.expect("result");
    assert_eq!(result.answer, "ab");
    assert!(!result.completed);
}

#[tokio::test]
async fn invalid_json_document_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .ask("q")
        .stream(false)
        .collect()
        .await
        .expect_err("should fail");
    assert!(matches!(err, AskError::Decode(_)));
}

#[tokio::test]
async fn deadline_applies_while_waiting_for_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(event_stream(STREAM_BODY).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = client_for(&server)
        .ask("q")
        .deadline(Duration::from_millis(100))
        .collect()
        .await
        .expect_err("should time out");
    assert!(matches!(err, AskError::Stream(StreamError::DeadlineExceeded(_))));
    assert_eq!(err.terminal_state(), Some(TerminalState::TransportFailed));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn abort_applies_while_waiting_for_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask"))
        .respond_with(event_stream(STREAM_BODY).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let handle = AbortHandle::new();
    let aborter = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        aborter.abort();
    });

    let started = Instant::now();
    let err = client_for(&server)
        .ask("q")
        .abort_signal(&handle)
        .collect()
        .await
        .expect_err("should cancel");
    assert!(matches!(err, AskError::Stream(StreamError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}
