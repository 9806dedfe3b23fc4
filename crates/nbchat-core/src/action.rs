// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Classification of a completion into the action the engine performs.

pub const UNDO_COMMAND: &str = "%undo";
pub const RUN_ALL_COMMAND: &str = "%run-all";
pub const RUN_COMMAND: &str = "%run";
pub const MARKDOWN_COMMAND: &str = "%markdown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Undo,
    RunAll,
    RunActive,
    /// Insert one documentation cell with this body.
    Markdown(String),
    /// Insert the instruction as documentation followed by this code.
    Code(String),
}

/// Classify a trimmed completion.
///
/// Prefixes are case-sensitive and checked in order; `%run-all` comes before
/// `%run` because it also starts with `%run`.  A `%markdown` reply needs a
/// whitespace separator and a body, otherwise the whole reply is treated as
/// code.
pub fn classify(completion: &str) -> Action {
    if completion.starts_with(UNDO_COMMAND) {
        Action::Undo
    } else if completion.starts_with(RUN_ALL_COMMAND) {
        Action::RunAll
    } else if completion.starts_with(RUN_COMMAND) {
        Action::RunActive
    } else if let Some(body) = markdown_body(completion) {
        Action::Markdown(body.to_string())
    } else {
        Action::Code(completion.to_string())
    }
}

fn markdown_body(completion: &str) -> Option<&str> {
    let rest = completion.strip_prefix(MARKDOWN_COMMAND)?;
    let sep = rest.chars().next().filter(|c| c.is_whitespace())?;
    let body = &rest[sep.len_utf8()..];
    (!body.trim().is_empty()).then_some(body)
}
