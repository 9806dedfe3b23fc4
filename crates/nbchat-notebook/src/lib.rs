// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! File-backed notebook host for Jupyter `.ipynb` documents (nbformat 4).
//!
//! The working copy lives in memory behind the [`nbchat_core::Notebook`]
//! trait; callers decide when to [`FileNotebook::save`].  The cursor and the
//! pending undo record are kept in the notebook metadata so an undo issued
//! by a later process reverts the insertion made by an earlier one.

mod error;
mod file;
mod format;

pub use error::NotebookError;
pub use file::{FileNotebook, SessionMetadata};
pub use format::{RawCell, RawNotebook, Source};
