// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
/// YAML-configured mock completion provider for end-to-end tests.
///
/// The provider reads a YAML file that maps instruction patterns to canned
/// completions, so CLI runs are deterministic without network access.
///
/// # YAML format
///
/// ```yaml
/// responses:
///   - match_type: contains       # contains | equals | starts_with | regex | default
///     pattern: "plot"
///     reply: "df.plot()"
///
///   - match_type: starts_with
///     pattern: "undo"
///     reply: "%undo"
///
///   - match_type: default
///     reply: "print('ok')"
/// ```
///
/// Rules are matched against the last `## ` instruction line of the prompt.
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{mock::last_instruction, CompletionError, CompletionRequest, CompletionResponse};

// ─── YAML schema ─────────────────────────────────────────────────────────────

/// Root document.
#[derive(Debug, Deserialize)]
pub struct MockConfig {
    pub responses: Vec<ResponseRule>,
}

/// One entry in the responses list.
#[derive(Debug, Deserialize)]
pub struct ResponseRule {
    /// How to match the last instruction.
    pub match_type: MatchType,
    /// Pattern string (ignored for `default` match type).
    #[serde(default)]
    pub pattern: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Contains,
    Equals,
    StartsWith,
    Regex,
    Default,
}

// ─── Provider ────────────────────────────────────────────────────────────────

pub struct YamlMockProvider {
    config: MockConfig,
    call_count: AtomicU32,
}

impl YamlMockProvider {
    /// Load a provider from a YAML file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading mock responses file: {}", path.display()))?;
        Self::load(&text)
    }

    /// Load a provider from a YAML string.
    pub fn load(yaml: &str) -> anyhow::Result<Self> {
        let config: MockConfig = serde_yaml::from_str(yaml)
            .context("parsing mock responses YAML")?;
        Ok(Self { config, call_count: AtomicU32::new(0) })
    }

    fn find_rule(&self, instruction: &str) -> Option<&ResponseRule> {
        let lower = instruction.to_lowercase();
        let mut default_rule = None;

        for rule in &self.config.responses {
            let pattern = rule.pattern.to_lowercase();
            let hit = match rule.match_type {
                MatchType::Default => {
                    default_rule = default_rule.or(Some(rule));
                    false
                }
                MatchType::Contains => lower.contains(&pattern),
                MatchType::Equals => lower == pattern,
                MatchType::StartsWith => lower.starts_with(&pattern),
                MatchType::Regex => regex::Regex::new(&rule.pattern)
                    .map(|re| re.is_match(instruction))
                    .unwrap_or(false),
            };
            if hit {
                return Some(rule);
            }
        }

        default_rule
    }
}

#[async_trait]
impl crate::CompletionProvider for YamlMockProvider {
    fn name(&self) -> &str { "yaml-mock" }
    fn model_name(&self) -> &str { "yaml-mock-model" }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let call_num = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        let instruction = last_instruction(&req.prompt).unwrap_or("");
        debug!(call_num, instruction, "yaml mock complete()");

        match self.find_rule(instruction) {
            Some(rule) => Ok(CompletionResponse::from_text(rule.reply.clone())),
            None => Err(CompletionError::Unavailable(format!(
                "no mock rule matched {instruction:?}"
            ))),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
