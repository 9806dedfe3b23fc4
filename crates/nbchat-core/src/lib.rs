// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod action;
mod cell;
mod engine;
mod error;
mod host;
mod prompts;
mod session;
mod transcript;
mod undo;

pub use action::{classify, Action};
pub use cell::{strip_heading_marker, Cell, CellKind};
pub use engine::{ActionEngine, AppliedAction, ExecutionHandle, SubmitOutcome};
pub use error::EngineError;
pub use host::{
    ExecutionContext, ExecutionError, HostError, IndexedCell, MemoryNotebook, NoopExecution,
    Notebook, SharedNotebook,
};
pub use prompts::{PromptTemplate, TemplateEntry, TemplateError, TemplateRepository};
pub use session::{Binding, Session};
pub use transcript::{assemble_prompt, build_transcript, format_instruction, normalize_instruction};
pub use undo::UndoRecord;
