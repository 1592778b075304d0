//! HTTP-level tests for the OpenAI-compatible client: continuation after
//! truncation, retry/backoff classification, and streaming merge.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use weft_core::Message;
use weft_llm::{LlmConfig, OpenAiClient, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> OpenAiClient {
    let config = LlmConfig::new("test-model", server.uri(), "test-key")
        .unwrap()
        .with_retry(RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        });
    OpenAiClient::new(config)
}

fn completion(content: &str, finish_reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "finish_reason": finish_reason,
            "message": {"content": content}
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5}
    })
}

#[tokio::test]
async fn generate_returns_finalized_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello", "stop")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let reply = client
        .generate(&[Message::user("hi")], &[])
        .await
        .unwrap();
    assert_eq!(reply.content, "hello");
    assert_eq!(reply.usage.prompt_tokens, 10);
    assert_eq!(reply.usage.api_calls, 1);
    assert!(!reply.partial);
}

#[tokio::test]
async fn truncated_completions_are_continued_and_merged() {
    let server = MockServer::start().await;
    // finish_reason sequence [length, length, stop]: three fragments that
    // must come back as one concatenated message.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("The quick ", "length")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("brown fox ", "length")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("jumps.", "stop")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let reply = client
        .generate(&[Message::user("tell me")], &[])
        .await
        .unwrap();
    assert_eq!(reply.content, "The quick brown fox jumps.");
    assert_eq!(reply.usage.api_calls, 3);
    assert!(!reply.partial);

    // The second request must carry the first fragment marked partial.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let tail = second["messages"].as_array().unwrap().last().unwrap();
    assert_eq!(tail["role"], "assistant");
    assert_eq!(tail["partial"], true);
}

#[tokio::test]
async fn continuation_rounds_are_bounded() {
    let server = MockServer::start().await;
    // A provider that never finishes: every response is a truncated
    // fragment. The client must stop after max_continuations extra rounds.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("again ", "length")))
        .expect(4) // initial call + 3 continuation rounds
        .mount(&server)
        .await;

    let client = test_client(&server);
    let reply = client
        .generate(&[Message::user("loop")], &[])
        .await
        .unwrap();
    assert_eq!(reply.content, "again again again again ");
    assert_eq!(reply.usage.api_calls, 4);
}

#[tokio::test]
async fn transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("recovered", "stop")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let reply = client
        .generate(&[Message::user("hi")], &[])
        .await
        .unwrap();
    assert_eq!(reply.content, "recovered");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .generate(&[Message::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"), "got: {err}");
}

fn sse_body(events: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn content_chunk(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-stream",
        "choices": [{"delta": {"content": content}, "finish_reason": null}]
    })
}

fn finish_chunk(reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-stream",
        "choices": [{"delta": {}, "finish_reason": reason}]
    })
}

fn tool_chunk(index: u32, id: &str, name: &str, arguments: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-stream",
        "choices": [{
            "delta": {"tool_calls": [{
                "index": index,
                "id": if id.is_empty() { serde_json::Value::Null } else { json!(id) },
                "function": {
                    "name": if name.is_empty() { serde_json::Value::Null } else { json!(name) },
                    "arguments": arguments
                }
            }]},
            "finish_reason": null
        }]
    })
}

fn usage_chunk(prompt_tokens: u64, completion_tokens: u64) -> serde_json::Value {
    json!({
        "id": "chatcmpl-stream",
        "choices": [],
        "usage": {"prompt_tokens": prompt_tokens, "completion_tokens": completion_tokens}
    })
}

#[tokio::test]
async fn streaming_merges_content_and_tool_calls() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        content_chunk("Let me "),
        content_chunk("look that up."),
        tool_chunk(0, "call_a", "search", "{\"q\":"),
        tool_chunk(0, "", "", "\"rust\"}"),
        tool_chunk(1, "call_b", "fetch", "{\"url\":\"x\"}"),
        finish_chunk("tool_calls"),
        usage_chunk(21, 9),
    ]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let (mut rx, handle) = client.generate_stream(vec![Message::user("hi")], vec![]);

    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot);
    }
    assert!(!snapshots.is_empty());
    // Snapshots grow monotonically: the first has a content prefix of the last.
    assert!(snapshots[0].content.len() <= snapshots.last().unwrap().content.len());

    let final_message = handle.await.unwrap().unwrap();
    assert_eq!(final_message.content, "Let me look that up.");
    let calls = final_message.tool_calls.unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].id, "call_a");
    assert_eq!(calls[0].arguments, "{\"q\":\"rust\"}");
    assert_eq!(calls[1].tool_name, "fetch");

    // The trailing usage chunk is folded into the final message.
    assert_eq!(final_message.usage.prompt_tokens, 21);
    assert_eq!(final_message.usage.completion_tokens, 9);
    assert_eq!(final_message.usage.api_calls, 1);

    // Streaming requests must ask the provider for that usage chunk.
    let requests = server.received_requests().await.unwrap();
    let request: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(request["stream"], true);
    assert_eq!(request["stream_options"]["include_usage"], true);
}

#[tokio::test]
async fn streaming_continues_after_truncation() {
    let server = MockServer::start().await;
    let first = sse_body(&[content_chunk("first half, "), finish_chunk("length")]);
    let second = sse_body(&[content_chunk("second half."), finish_chunk("stop")]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(first, "text/event-stream"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(second, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let (mut rx, handle) = client.generate_stream(vec![Message::user("hi")], vec![]);
    while rx.recv().await.is_some() {}

    let final_message = handle.await.unwrap().unwrap();
    assert_eq!(final_message.content, "first half, second half.");
    assert!(!final_message.partial);
}
