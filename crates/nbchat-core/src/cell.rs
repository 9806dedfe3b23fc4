// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Code,
    Documentation,
}

/// One unit of a notebook.  Cells carry no position; the host sequence index
/// is the only address and is renumbered by every insert and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub text: String,
}

impl Cell {
    pub fn code(text: impl Into<String>) -> Self {
        Self { kind: CellKind::Code, text: text.into() }
    }

    pub fn documentation(text: impl Into<String>) -> Self {
        Self { kind: CellKind::Documentation, text: text.into() }
    }

    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// For a documentation cell written as `# instruction`, the instruction
    /// with its heading marker removed.
    pub fn instruction_text(&self) -> Option<&str> {
        if self.kind != CellKind::Documentation {
            return None;
        }
        let trimmed = self.text.trim();
        trimmed
            .starts_with("# ")
            .then(|| strip_heading_marker(trimmed))
    }
}

/// Remove a leading run of `#` followed by one whitespace character.
/// Text without such a marker is returned unchanged.
pub fn strip_heading_marker(line: &str) -> &str {
    let rest = line.trim_start_matches('#');
    if rest.len() == line.len() {
        return line;
    }
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => &rest[c.len_utf8()..],
        _ => line,
    }
}
