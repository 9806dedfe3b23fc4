// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use crate::{
    error::EngineError,
    host::{lock_notebook, ExecutionContext, SharedNotebook},
    undo::UndoRecord,
};

/// The notebook a session targets plus the context that executes its cells.
#[derive(Clone)]
pub struct Binding {
    pub notebook: SharedNotebook,
    pub execution: Arc<dyn ExecutionContext>,
}

impl Binding {
    pub fn new(notebook: SharedNotebook, execution: Arc<dyn ExecutionContext>) -> Self {
        Self { notebook, execution }
    }

    pub fn notebook_id(&self) -> String {
        lock_notebook(&self.notebook).id().to_string()
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("notebook", &self.notebook_id())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    binding: Option<Binding>,
    undo: UndoRecord,
    /// Bumped on every bind/unbind so in-flight responses can detect that
    /// the notebook they were built from is no longer the target.
    generation: u64,
}

/// Engine state for one user: the active binding, the pending undo record
/// and the single-flight flag.  Cloning yields another handle to the same
/// session.
#[derive(Clone)]
pub struct Session {
    id: String,
    state: Arc<Mutex<SessionState>>,
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one submission or undo; releases the busy flag
/// when dropped.
#[derive(Debug)]
pub(crate) struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(SessionState::default())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A session already bound to `binding`.
    pub fn bound(binding: Binding) -> Self {
        let s = Self::new();
        s.bind(binding);
        s
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `binding` the active target.  Clears the undo record; responses
    /// still in flight for the previous binding will be discarded.
    pub fn bind(&self, binding: Binding) {
        let mut st = self.state();
        debug!(session = %self.id, notebook = %binding.notebook_id(), "binding notebook");
        st.binding = Some(binding);
        st.undo.clear();
        st.generation += 1;
    }

    /// Drop the binding if it targets `notebook_id` (the notebook was
    /// closed).  Returns whether anything was unbound.
    pub fn unbind(&self, notebook_id: &str) -> bool {
        let mut st = self.state();
        let matches = st
            .binding
            .as_ref()
            .is_some_and(|b| b.notebook_id() == notebook_id);
        if matches {
            debug!(session = %self.id, notebook = %notebook_id, "unbinding notebook");
            st.binding = None;
            st.undo.clear();
            st.generation += 1;
        }
        matches
    }

    pub fn binding(&self) -> Option<Binding> {
        self.state().binding.clone()
    }

    pub fn undo_record(&self) -> UndoRecord {
        self.state().undo
    }

    /// Seed the undo record, e.g. from state persisted alongside a notebook.
    pub fn restore_undo_record(&self, record: UndoRecord) {
        self.state().undo = record;
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn try_begin(&self) -> Result<FlightGuard, EngineError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard { busy: self.busy.clone() })
            .map_err(|_| EngineError::Busy)
    }

    /// Current binding and its generation.
    pub(crate) fn snapshot(&self) -> Result<(Binding, u64), EngineError> {
        let st = self.state();
        let binding = st.binding.clone().ok_or(EngineError::NotBound)?;
        Ok((binding, st.generation))
    }

    /// Run `f` against the undo record while the session is locked, provided
    /// the binding has not changed since `generation` was observed.
    pub(crate) fn apply<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut UndoRecord) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let mut st = self.state();
        if st.generation != generation {
            return Err(EngineError::BindingChanged);
        }
        f(&mut st.undo)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
