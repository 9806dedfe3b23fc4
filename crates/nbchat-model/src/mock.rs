// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{CompletionError, CompletionRequest, CompletionResponse};

/// The text of the last `## ` instruction line in a transcript prompt.
pub(crate) fn last_instruction(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .rev()
        .find_map(|l| l.strip_prefix("## "))
        .map(str::trim)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deterministic mock provider for tests.  Echoes the last instruction of the
/// prompt back as a Python comment.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let instruction = last_instruction(&req.prompt).unwrap_or("[no instruction]");
        Ok(CompletionResponse::from_text(format!("# MOCK: {instruction}")))
    }
}

/// One pre-scripted answer of a [`ScriptedMockProvider`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// A pre-scripted mock provider.  Each call to `complete` pops the next
/// reply from the front of the queue, so tests can drive the engine through
/// exact response sequences without network access.  Once the queue is
/// drained the `fallback` reply is returned.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<ScriptedReply>>>,
    fallback: ScriptedReply,
    /// Every request seen, in call order.
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// When set, each call waits for one notification before answering.
    gate: Option<Arc<Notify>>,
}

impl ScriptedMockProvider {
    pub fn new(scripts: Vec<ScriptedReply>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            fallback: ScriptedReply::Text("[no more scripts]".into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Convenience: provider that returns the given texts in order.
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())).collect())
    }

    /// Convenience: provider that returns `reply` on every call.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_fallback(ScriptedReply::Text(reply.into()))
    }

    /// Reply used once the scripted queue is drained.
    pub fn with_fallback(mut self, reply: ScriptedReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Convenience: provider whose first call fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Fail(reason.into())])
    }

    /// Hold every call until `gate` is notified.  Lets tests keep a request
    /// in flight while they poke at the caller.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl crate::CompletionProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        lock(&self.requests).push(req);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = {
            let mut scripts = lock(&self.scripts);
            if scripts.is_empty() {
                self.fallback.clone()
            } else {
                scripts.remove(0)
            }
        };
        match next {
            ScriptedReply::Text(t) => Ok(CompletionResponse::from_text(t)),
            ScriptedReply::Fail(reason) => Err(CompletionError::Unavailable(reason)),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
