// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Wire-format tests: spin up a minimal HTTP/1.1 mock server, point the
//! completions driver at it, issue a `CompletionRequest`, and assert both the
//! HTTP request the driver sent and the response it decoded.
//!
//! These tests run without any API keys and without external network access.

use std::collections::HashMap;

use nbchat_config::{CompletionConfig, ModelConfig};
use nbchat_model::{from_config, CompletionError, CompletionRequest};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

// ── Minimal HTTP/1.1 mock server ──────────────────────────────────────────────

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Value,
}

/// Bind a one-shot HTTP/1.1 mock server on a random loopback port.
/// It accepts exactly one request, captures it, and replies with the given
/// status + body.
async fn mock_server_once(
    status: u16,
    resp_body: impl Into<String> + Send + 'static,
) -> (u16, tokio::sync::oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = tokio::sync::oneshot::channel::<CapturedRequest>();

    tokio::spawn(async move {
        let resp_body: String = resp_body.into();
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();
        let mut parts = request_line.trim().splitn(3, ' ');
        let method = parts.next().unwrap_or("").to_string();
        let path = parts.next().unwrap_or("").to_string();

        let mut headers: HashMap<String, String> = HashMap::new();
        let mut content_length: usize = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some((k, v)) = trimmed.split_once(": ") {
                let key = k.to_lowercase();
                if key == "content-length" {
                    content_length = v.parse().unwrap_or(0);
                }
                headers.insert(key, v.to_string());
            }
        }

        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        let _ = tx.send(CapturedRequest { method, path, headers, body });

        let http_resp = format!(
            "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            resp_body.len(),
            resp_body,
        );
        let _ = write_half.write_all(http_resp.as_bytes()).await;
    });

    (port, rx)
}

fn config_for(port: u16, api_key: Option<&str>) -> ModelConfig {
    ModelConfig {
        provider: "openai".into(),
        name: "test-instruct".into(),
        api_key: api_key.map(str::to_string),
        api_key_env: None,
        base_url: Some(format!("http://127.0.0.1:{port}/v1")),
        ..ModelConfig::default()
    }
}

const OK_BODY: &str = r#"{"id":"cmpl-1","model":"test-instruct","choices":[{"text":"\nprint(x)\n","index":0,"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#;

// ── Request shape ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn sends_fixed_request_shape_to_completions_path() {
    let (port, req_rx) = mock_server_once(200, OK_BODY).await;
    let provider = from_config(&config_for(port, Some("sk-test"))).unwrap();

    let req = CompletionRequest::new("x=1\n## Print x\n", &CompletionConfig::default());
    provider.complete(req).await.unwrap();

    let captured = req_rx.await.unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/v1/completions");
    let body = &captured.body;
    assert_eq!(body["model"], "test-instruct");
    assert_eq!(body["prompt"], "x=1\n## Print x\n");
    assert_eq!(body["max_tokens"], 500);
    assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert_eq!(body["top_p"], 1.0);
    assert_eq!(body["presence_penalty"], 0.0);
    assert_eq!(body["frequency_penalty"], 0.0);
    assert_eq!(body["best_of"], 1);
    assert_eq!(body["n"], 1);
    assert_eq!(body["stream"], false);
    assert_eq!(body["stop"], serde_json::json!(["## "]));
}

#[tokio::test]
async fn sends_bearer_auth_header_when_key_present() {
    let (port, req_rx) = mock_server_once(200, OK_BODY).await;
    let provider = from_config(&config_for(port, Some("sk-secret"))).unwrap();
    provider.complete(CompletionRequest::default()).await.unwrap();

    let captured = req_rx.await.unwrap();
    assert_eq!(
        captured.headers.get("authorization").map(String::as_str),
        Some("Bearer sk-secret")
    );
}

#[tokio::test]
async fn omits_auth_header_without_key() {
    let (port, req_rx) = mock_server_once(200, OK_BODY).await;
    let provider = from_config(&config_for(port, None)).unwrap();
    provider.complete(CompletionRequest::default()).await.unwrap();

    let captured = req_rx.await.unwrap();
    assert!(!captured.headers.contains_key("authorization"));
}

// ── Response decoding ─────────────────────────────────────────────────────────

#[tokio::test]
async fn decodes_top_choice_and_usage() {
    let (port, _req_rx) = mock_server_once(200, OK_BODY).await;
    let provider = from_config(&config_for(port, Some("k"))).unwrap();
    let resp = provider.complete(CompletionRequest::default()).await.unwrap();

    assert_eq!(resp.top_text().unwrap(), "\nprint(x)\n");
    assert_eq!(resp.usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn non_200_response_returns_status_error() {
    let (port, _req_rx) =
        mock_server_once(401, r#"{"error":{"message":"bad key"}}"#).await;
    let provider = from_config(&config_for(port, Some("k"))).unwrap();
    let err = provider.complete(CompletionRequest::default()).await.unwrap_err();

    match err {
        CompletionError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_returns_malformed_error() {
    let (port, _req_rx) = mock_server_once(200, "not json").await;
    let provider = from_config(&config_for(port, Some("k"))).unwrap();
    let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Malformed(_)));
}

#[tokio::test]
async fn empty_choices_returns_no_choices_error() {
    let (port, _req_rx) = mock_server_once(200, r#"{"choices":[]}"#).await;
    let provider = from_config(&config_for(port, Some("k"))).unwrap();
    let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
    assert!(matches!(err, CompletionError::NoChoices));
}

#[tokio::test]
async fn unreachable_server_returns_http_error() {
    // Bind and immediately drop to get a port nobody listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let provider = from_config(&config_for(port, Some("k"))).unwrap();
    let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Http(_)));
}
