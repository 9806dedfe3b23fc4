// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::{CompletionError, CompletionRequest, CompletionResponse};

/// A text-completion backend.  One request yields exactly one response; there
/// is no streaming and no retry at this layer.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send a completion request and wait for the full response.
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, CompletionError>;
}
