// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Capabilities the engine needs from the notebook environment.
//!
//! [`Notebook`] is the editable cell sequence with its cursor; an
//! [`ExecutionContext`] runs cells.  Together they form a session binding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::cell::Cell;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cell index {index} out of range (notebook has {len} cells)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("notebook host error: {0}")]
    Other(String),
}

/// An ordered, mutable sequence of cells plus an active-cell cursor.
pub trait Notebook: Send {
    /// Stable identifier of the notebook (path, document id, ...).
    fn id(&self) -> &str;

    /// Snapshot of the cell sequence.
    fn cells(&self) -> Vec<Cell>;

    fn len(&self) -> usize {
        self.cells().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, index: usize) -> Option<Cell> {
        self.cells().into_iter().nth(index)
    }

    /// Index of the active cell.  Meaningless (0) for an empty notebook.
    fn active_index(&self) -> usize;

    /// Move the cursor.  Hosts clamp to the last cell.
    fn set_active_index(&mut self, index: usize);

    /// Insert `cell` so that it ends up at `index` (`index == len` appends).
    fn insert_cell_at(&mut self, index: usize, cell: Cell) -> Result<(), HostError>;

    /// Remove and return the cell at `index`.
    fn delete_cell_at(&mut self, index: usize) -> Result<Cell, HostError>;
}

pub type SharedNotebook = Arc<Mutex<dyn Notebook>>;

/// Lock a shared notebook, recovering the data from a poisoned lock.  The
/// engine never holds the lock across an await point.
pub(crate) fn lock_notebook(nb: &SharedNotebook) -> MutexGuard<'_, dyn Notebook + 'static> {
    nb.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A cell handed to an execution context together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedCell {
    pub index: usize,
    pub cell: Cell,
}

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("execution of cell {index} failed: {message}")]
    CellFailed { index: usize, message: String },

    #[error("execution failed: {0}")]
    Failed(String),

    #[error("execution task was aborted")]
    Aborted,
}

/// Runs cells of a bound notebook (a kernel session, a subprocess, ...).
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    async fn run_cells(&self, notebook_id: &str, cells: Vec<IndexedCell>) -> Result<(), ExecutionError>;
}

/// Execution context for hosts without a kernel: accepts every request and
/// only logs it.
#[derive(Debug, Default)]
pub struct NoopExecution;

#[async_trait]
impl ExecutionContext for NoopExecution {
    async fn run_cells(&self, notebook_id: &str, cells: Vec<IndexedCell>) -> Result<(), ExecutionError> {
        let indices: Vec<usize> = cells.iter().map(|c| c.index).collect();
        info!(notebook = %notebook_id, ?indices, "no kernel attached; skipping execution");
        Ok(())
    }
}

// ─── In-memory host ──────────────────────────────────────────────────────────

/// A plain in-memory notebook.  Used by tests and as the working model of
/// file-backed hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNotebook {
    id: String,
    cells: Vec<Cell>,
    active: usize,
}

impl MemoryNotebook {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), cells: Vec::new(), active: 0 }
    }

    pub fn with_cells(id: impl Into<String>, cells: Vec<Cell>, active: usize) -> Self {
        let mut nb = Self { id: id.into(), cells, active: 0 };
        nb.set_active_index(active);
        nb
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    fn clamp(&mut self) {
        self.active = self.active.min(self.cells.len().saturating_sub(1));
    }
}

impl Notebook for MemoryNotebook {
    fn id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).cloned()
    }

    fn active_index(&self) -> usize {
        self.active
    }

    fn set_active_index(&mut self, index: usize) {
        self.active = index;
        self.clamp();
    }

    fn insert_cell_at(&mut self, index: usize, cell: Cell) -> Result<(), HostError> {
        if index > self.cells.len() {
            return Err(HostError::IndexOutOfRange { index, len: self.cells.len() });
        }
        self.cells.insert(index, cell);
        Ok(())
    }

    fn delete_cell_at(&mut self, index: usize) -> Result<Cell, HostError> {
        if index >= self.cells.len() {
            return Err(HostError::IndexOutOfRange { index, len: self.cells.len() });
        }
        let removed = self.cells.remove(index);
        self.clamp();
        Ok(removed)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn nb() -> MemoryNotebook {
        MemoryNotebook::with_cells(
            "nb",
            vec![Cell::code("a"), Cell::code("b"), Cell::code("c")],
            1,
        )
    }

    #[test]
    fn with_cells_clamps_active_index() {
        let n = MemoryNotebook::with_cells("nb", vec![Cell::code("a")], 7);
        assert_eq!(n.active_index(), 0);
    }

    #[test]
    fn insert_at_len_appends() {
        let mut n = nb();
        n.insert_cell_at(3, Cell::code("d")).unwrap();
        assert_eq!(n.cell(3), Some(Cell::code("d")));
    }

    #[test]
    fn insert_past_len_is_rejected() {
        let mut n = nb();
        let err = n.insert_cell_at(5, Cell::code("x")).unwrap_err();
        assert!(matches!(err, HostError::IndexOutOfRange { index: 5, len: 3 }));
    }

    #[test]
    fn delete_last_cell_clamps_cursor() {
        let mut n = nb();
        n.set_active_index(2);
        assert_eq!(n.delete_cell_at(2).unwrap(), Cell::code("c"));
        assert_eq!(n.active_index(), 1);
    }

    #[test]
    fn delete_out_of_range_is_rejected() {
        let mut n = MemoryNotebook::new("empty");
        assert!(n.delete_cell_at(0).is_err());
        assert!(n.is_empty());
    }

    #[tokio::test]
    async fn noop_execution_accepts_everything() {
        let cells = vec![IndexedCell { index: 0, cell: Cell::code("1/0") }];
        assert!(NoopExecution.run_cells("nb", cells).await.is_ok());
    }
}
