// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Serde default helper.
///
/// `#[serde(default)]` on a `bool` always falls back to `false`, so a named
/// function is required for fields that are enabled unless switched off.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider identifier: "openai" | "mock"
    pub provider: String,
    /// Model name forwarded to the completions endpoint
    pub name: String,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files
    pub api_key: Option<String>,
    /// Base URL override, ending before `/completions`.
    /// Useful for local OpenAI-compatible servers and proxies.
    pub base_url: Option<String>,
    /// Request timeout in seconds (0 = no limit)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path to YAML mock-responses file (used when provider = "mock").
    /// Can also be set via the NBCHAT_MOCK_RESPONSES environment variable.
    pub mock_responses_file: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            name: "gpt-3.5-turbo-instruct".into(),
            api_key_env: Some("OPENAI_API_KEY".into()),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            mock_responses_file: None,
        }
    }
}

/// Generation parameters sent with every completion request.
///
/// The defaults are the fixed request shape the engine was tuned for; the
/// single `"## "` stop sequence ends the completion at the next instruction
/// marker of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default = "default_one")]
    pub best_of: u32,
    #[serde(default = "default_one")]
    pub n: u32,
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.1
}
fn default_top_p() -> f32 {
    1.0
}
fn default_one() -> u32 {
    1
}
fn default_stop() -> Vec<String> {
    vec!["## ".into()]
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            best_of: 1,
            n: 1,
            stop: default_stop(),
        }
    }
}

/// Where the prompt preamble and examples come from.
///
/// Resolution order: `template_file`, then `template` looked up in the
/// repository at `repository_url`, then the built-in template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Local template file (`~` is expanded).
    #[serde(default)]
    pub template_file: Option<String>,
    /// Index JSON of a prompt template repository.
    #[serde(default = "default_repository_url")]
    pub repository_url: String,
    /// Name or source path of a template in the repository.
    #[serde(default)]
    pub template: Option<String>,
}

fn default_repository_url() -> String {
    "https://raw.githubusercontent.com/oeway/codex-chat-notebook/master/codex-prompt-repository/index.json"
        .into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template_file: None,
            repository_url: default_repository_url(),
            template: None,
        }
    }
}

impl PromptConfig {
    /// The configured template file with `~` and environment variables
    /// expanded.  Falls back to the raw string when expansion fails.
    pub fn template_path(&self) -> Option<PathBuf> {
        self.template_file.as_deref().map(|raw| {
            let expanded = shellexpand::full(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            PathBuf::from(expanded)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Execute the generated code cell right after it is inserted.
    #[serde(default = "default_true")]
    pub run_after_insert: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { run_after_insert: true }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
