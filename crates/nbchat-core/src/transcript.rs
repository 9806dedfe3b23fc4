// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Replays the cells up to the cursor as a pseudo-code transcript.
//!
//! Documentation cells become `## instruction` lines (with any further lines
//! quoted between `"""` delimiters) and code cells are copied verbatim, so a
//! completion model continues the pattern with code for the next `##` line.
//! The preamble and examples are attached once, to the first documentation
//! cell of the pass, wherever it sits.

use crate::cell::{strip_heading_marker, Cell, CellKind};

const DETAILS_DELIMITER: &str = "\"\"\"";

/// Build one block per cell in `cells[..=active_index]`.
pub fn build_transcript(
    cells: &[Cell],
    active_index: usize,
    preamble: &str,
    examples: &str,
) -> Vec<String> {
    let mut first_documentation = true;
    cells
        .iter()
        .take(active_index.saturating_add(1))
        .map(|cell| match cell.kind {
            CellKind::Code => cell.text.clone(),
            CellKind::Documentation => {
                let block = documentation_block(&cell.text, first_documentation, preamble, examples);
                first_documentation = false;
                block
            }
        })
        .collect()
}

fn documentation_block(text: &str, first: bool, preamble: &str, examples: &str) -> String {
    let mut lines = text.lines();
    let title = lines.next().unwrap_or("");
    let details: Vec<&str> = lines.collect();

    let mut block = format!("## {}", strip_heading_marker(title));
    if !first && details.is_empty() {
        return block;
    }

    let mut quoted = Vec::with_capacity(2);
    if first {
        quoted.push(preamble.to_string());
    }
    if !details.is_empty() {
        quoted.push(details.join("\n"));
    }
    block.push('\n');
    block.push_str(DETAILS_DELIMITER);
    block.push('\n');
    block.push_str(&quoted.join("\n"));
    block.push('\n');
    block.push_str(DETAILS_DELIMITER);

    if first {
        block.push('\n');
        block.push_str(examples);
    }
    block
}

/// Trim the raw instruction and upper-case its first character.
pub fn normalize_instruction(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a normalized instruction the way documentation cells appear in the
/// transcript: `## first line`, then any remaining lines quoted.
pub fn format_instruction(instruction: &str) -> String {
    let mut lines = instruction.lines();
    let title = lines.next().unwrap_or("");
    let details: Vec<&str> = lines.collect();

    let mut out = format!("## {}", strip_heading_marker(title));
    if !details.is_empty() {
        out.push('\n');
        out.push_str(DETAILS_DELIMITER);
        out.push('\n');
        out.push_str(&details.join("\n"));
        out.push('\n');
        out.push_str(DETAILS_DELIMITER);
    }
    out
}

/// Full prompt: transcript blocks, then the formatted instruction, newline
/// terminated.
pub fn assemble_prompt(transcript: &[String], instruction: &str) -> String {
    format!("{}\n{}\n", transcript.join("\n"), format_instruction(instruction))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
