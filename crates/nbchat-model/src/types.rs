// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use nbchat_config::CompletionConfig;
use serde::{Deserialize, Serialize};

use crate::CompletionError;

// ─── Request ──────────────────────────────────────────────────────────────────

/// A single completion request.  Field names follow the `/completions` wire
/// format so the struct serialises directly into the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub best_of: u32,
    pub n: u32,
    pub stream: bool,
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Build a non-streaming request for `prompt` with the configured
    /// generation parameters.
    pub fn new(prompt: impl Into<String>, params: &CompletionConfig) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
            best_of: params.best_of,
            n: params.n,
            stream: false,
            stop: params.stop.clone(),
        }
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new(String::new(), &CompletionConfig::default())
    }
}

// ─── Response ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Response carrying a single choice with `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![Choice { text: text.into(), index: 0, finish_reason: Some("stop".into()) }],
            usage: None,
        }
    }

    /// Text of the top choice.
    pub fn top_text(&self) -> Result<&str, CompletionError> {
        self.choices
            .first()
            .map(|c| c.text.as_str())
            .ok_or(CompletionError::NoChoices)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
