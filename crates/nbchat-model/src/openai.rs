// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! OpenAI legacy text-completions driver.
//!
//! Speaks `POST {base}/completions` with a JSON body and a single JSON
//! response (no SSE).  Works against api.openai.com and any local server that
//! implements the same wire format (vLLM, llama.cpp server, LM Studio).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::{CompletionError, CompletionRequest, CompletionResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Request body: the model id plus the request fields, flattened.
#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

pub struct OpenAiProvider {
    /// Model id forwarded to the API.
    model: String,
    /// API key (pre-resolved from config or env).  `None` sends no auth
    /// header, which is what local servers expect.
    api_key: Option<String>,
    /// Full completions URL, e.g. `https://api.openai.com/v1/completions`.
    completions_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// - `base_url`: API base that ends **before** `/completions`
    /// - `timeout`: whole-request timeout; `None` waits indefinitely
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        let base = base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            model,
            api_key,
            completions_url: format!("{base}/completions"),
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl crate::CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        debug!(
            url = %self.completions_url,
            model = %self.model,
            prompt_chars = req.prompt.len(),
            "sending completion request"
        );

        let mut http = self
            .client
            .post(&self.completions_url)
            .json(&WireRequest { model: &self.model, request: &req });
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let resp = http.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;
        if parsed.choices.is_empty() {
            return Err(CompletionError::NoChoices);
        }
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }
        Ok(parsed)
    }
}
