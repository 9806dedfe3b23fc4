// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod error;
mod types;
mod provider;
mod openai;
mod mock;
mod yaml_mock;

pub use error::CompletionError;
pub use types::*;
pub use provider::CompletionProvider;
pub use openai::OpenAiProvider;
pub use mock::{MockProvider, ScriptedMockProvider, ScriptedReply};
pub use yaml_mock::YamlMockProvider;

use std::time::Duration;

use anyhow::bail;
use nbchat_config::ModelConfig;

/// Construct a boxed [`CompletionProvider`] from configuration.
///
/// Provider selection:
/// - `"openai"` → [`OpenAiProvider`] (any server speaking the legacy
///   `/completions` wire format)
/// - `"mock"` → [`YamlMockProvider`] if a responses file is configured,
///   otherwise [`MockProvider`] (echo-back)
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Box<dyn CompletionProvider>> {
    match cfg.provider.as_str() {
        "openai" => {
            let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
            Ok(Box::new(OpenAiProvider::new(
                cfg.name.clone(),
                resolve_api_key(cfg),
                cfg.base_url.clone(),
                timeout,
            )?))
        }
        "mock" => {
            // Prefer env var, then config field
            let responses_path = std::env::var("NBCHAT_MOCK_RESPONSES").ok()
                .or_else(|| cfg.mock_responses_file.clone());
            if let Some(path) = responses_path {
                Ok(Box::new(YamlMockProvider::from_file(&path)?))
            } else {
                Ok(Box::new(MockProvider))
            }
        }
        other => bail!("unknown completion provider: {other}"),
    }
}

fn resolve_api_key(cfg: &ModelConfig) -> Option<String> {
    if let Some(k) = &cfg.api_key {
        return Some(k.clone());
    }
    if let Some(env) = &cfg.api_key_env {
        return std::env::var(env).ok();
    }
    None
}
