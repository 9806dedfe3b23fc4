// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::fs;
use std::path::{Path, PathBuf};

use nbchat_core::{Cell, HostError, Notebook, UndoRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::NotebookError,
    format::{RawCell, RawNotebook},
};

/// Key under the notebook-level `metadata` holding [`SessionMetadata`].
const METADATA_KEY: &str = "nbchat";

/// Engine state persisted alongside the cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub active_index: usize,
    #[serde(default)]
    pub undo: UndoRecord,
}

/// An `.ipynb` file opened as a [`Notebook`].
#[derive(Debug, Clone)]
pub struct FileNotebook {
    path: PathBuf,
    id: String,
    doc: RawNotebook,
    active: usize,
    undo: UndoRecord,
}

impl FileNotebook {
    /// Read and validate the notebook at `path`.
    pub fn open(path: &Path) -> Result<Self, NotebookError> {
        let text = fs::read_to_string(path).map_err(|source| NotebookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: RawNotebook = serde_json::from_str(&text).map_err(|source| NotebookError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if doc.nbformat != 4 {
            return Err(NotebookError::UnsupportedFormat {
                major: doc.nbformat,
                minor: doc.nbformat_minor,
            });
        }

        let meta = doc
            .metadata
            .get(METADATA_KEY)
            .cloned()
            .map(serde_json::from_value::<SessionMetadata>)
            .transpose()
            .unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session metadata");
                None
            })
            .unwrap_or_default();

        let mut nb = Self {
            path: path.to_path_buf(),
            id: path.display().to_string(),
            doc,
            active: 0,
            undo: UndoRecord::default(),
        };
        if meta.undo.is_empty() || meta.undo.fits(nb.len()) {
            nb.undo = meta.undo;
        } else {
            warn!(
                path = %path.display(),
                inserted = meta.undo.inserted,
                end = meta.undo.end_index,
                cells = nb.len(),
                "dropping undo record outside the notebook"
            );
        }
        nb.set_active_index(meta.active_index);
        debug!(notebook = %nb.id, cells = nb.len(), "opened notebook");
        Ok(nb)
    }

    /// An empty nbformat 4.5 notebook that will be written to `path`.
    pub fn create(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id: path.display().to_string(),
            doc: RawNotebook::default(),
            active: 0,
            undo: UndoRecord::default(),
        }
    }

    /// [`open`](Self::open) if `path` exists, otherwise [`create`](Self::create).
    pub fn open_or_create(path: &Path) -> Result<Self, NotebookError> {
        if path.exists() {
            Self::open(path)
        } else {
            debug!(path = %path.display(), "creating new notebook");
            Ok(Self::create(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &RawNotebook {
        &self.doc
    }

    pub fn undo_record(&self) -> UndoRecord {
        self.undo
    }

    /// Record the session's pending undo so the next [`save`](Self::save)
    /// persists it.
    pub fn set_undo_record(&mut self, record: UndoRecord) {
        self.undo = record;
    }

    /// Write the notebook back to its path, Jupyter style: one-space indent
    /// and a trailing newline.
    pub fn save(&mut self) -> Result<(), NotebookError> {
        let meta = SessionMetadata { active_index: self.active, undo: self.undo };
        let meta = serde_json::to_value(meta).map_err(|source| NotebookError::Json {
            path: self.path.clone(),
            source,
        })?;
        self.doc.metadata.insert(METADATA_KEY.into(), meta);

        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.doc.serialize(&mut ser).map_err(|source| NotebookError::Json {
            path: self.path.clone(),
            source,
        })?;
        buf.push(b'\n');

        fs::write(&self.path, buf).map_err(|source| NotebookError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(notebook = %self.id, cells = self.len(), "saved notebook");
        Ok(())
    }

    fn new_cell_id(&self) -> Option<String> {
        self.doc
            .wants_cell_ids()
            .then(|| uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
    }
}

impl Notebook for FileNotebook {
    fn id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<Cell> {
        self.doc.cells.iter().map(RawCell::to_cell).collect()
    }

    fn len(&self) -> usize {
        self.doc.cells.len()
    }

    fn cell(&self, index: usize) -> Option<Cell> {
        self.doc.cells.get(index).map(RawCell::to_cell)
    }

    fn active_index(&self) -> usize {
        self.active
    }

    fn set_active_index(&mut self, index: usize) {
        self.active = index.min(self.len().saturating_sub(1));
    }

    fn insert_cell_at(&mut self, index: usize, cell: Cell) -> Result<(), HostError> {
        if index > self.len() {
            return Err(HostError::IndexOutOfRange { index, len: self.len() });
        }
        let raw = RawCell::new(&cell, self.new_cell_id());
        self.doc.cells.insert(index, raw);
        Ok(())
    }

    fn delete_cell_at(&mut self, index: usize) -> Result<Cell, HostError> {
        if index >= self.len() {
            return Err(HostError::IndexOutOfRange { index, len: self.len() });
        }
        let removed = self.doc.cells.remove(index);
        let active = self.active;
        self.set_active_index(active);
        Ok(removed.to_cell())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
