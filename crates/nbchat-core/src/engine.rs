// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use nbchat_config::{CompletionConfig, Config};
use nbchat_model::{CompletionProvider, CompletionRequest};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    action::{classify, Action},
    cell::Cell,
    error::EngineError,
    host::{lock_notebook, ExecutionError, IndexedCell, Notebook},
    prompts::PromptTemplate,
    session::{Binding, Session},
    transcript::{assemble_prompt, build_transcript, normalize_instruction},
    undo::UndoRecord,
};

/// A cell execution running in the background.  Await [`wait`] for the
/// result or drop the handle to let it finish unobserved; failures are
/// logged either way.
///
/// [`wait`]: ExecutionHandle::wait
#[derive(Debug)]
pub struct ExecutionHandle {
    task: JoinHandle<Result<(), ExecutionError>>,
}

impl ExecutionHandle {
    pub async fn wait(self) -> Result<(), ExecutionError> {
        self.task.await.unwrap_or(Err(ExecutionError::Aborted))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// What a submission did to the notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedAction {
    /// The last insertion was reverted; carries the restored instruction.
    Undo { restored: String },
    RunAll,
    RunActive,
    InsertedDocumentation { index: usize },
    InsertedCode { documentation_index: usize, code_index: usize },
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub prompt: String,
    /// The trimmed top completion.
    pub completion: String,
    pub action: AppliedAction,
    /// Execution started by this submission, if any.
    pub execution: Option<ExecutionHandle>,
}

/// Turns instructions into completions and completions into notebook edits.
pub struct ActionEngine {
    provider: Arc<dyn CompletionProvider>,
    template: PromptTemplate,
    params: CompletionConfig,
    run_after_insert: bool,
}

impl ActionEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>, template: PromptTemplate) -> Self {
        Self {
            provider,
            template,
            params: CompletionConfig::default(),
            run_after_insert: true,
        }
    }

    pub fn from_config(
        provider: Arc<dyn CompletionProvider>,
        template: PromptTemplate,
        config: &Config,
    ) -> Self {
        Self::new(provider, template)
            .with_params(config.completion.clone())
            .with_run_after_insert(config.engine.run_after_insert)
    }

    pub fn with_params(mut self, params: CompletionConfig) -> Self {
        self.params = params;
        self
    }

    pub fn with_run_after_insert(mut self, run: bool) -> Self {
        self.run_after_insert = run;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn set_template(&mut self, template: PromptTemplate) {
        self.template = template;
    }

    /// The prompt `instruction` would be sent with, or `None` for a blank
    /// instruction.
    pub fn build_prompt(&self, session: &Session, instruction: &str) -> Result<Option<String>, EngineError> {
        let instruction = normalize_instruction(instruction);
        if instruction.is_empty() {
            return Ok(None);
        }
        let (binding, _) = session.snapshot()?;
        Ok(Some(self.prompt_for(&binding, &instruction)))
    }

    fn prompt_for(&self, binding: &Binding, instruction: &str) -> String {
        let nb = lock_notebook(&binding.notebook);
        let transcript = build_transcript(
            &nb.cells(),
            nb.active_index(),
            &self.template.prefix,
            &self.template.examples,
        );
        assemble_prompt(&transcript, instruction)
    }

    /// Run one instruction end to end.  Returns `Ok(None)` for a blank
    /// instruction, which sends nothing.
    ///
    /// Only one submission per session may be in flight; a second one fails
    /// with [`EngineError::Busy`].  If the session is re-bound while the
    /// completion is pending, the response is discarded.
    pub async fn submit(&self, session: &Session, instruction: &str) -> Result<Option<SubmitOutcome>, EngineError> {
        let instruction = normalize_instruction(instruction);
        if instruction.is_empty() {
            debug!("ignoring blank instruction");
            return Ok(None);
        }

        let _guard = session.try_begin()?;
        let (binding, generation) = session.snapshot()?;
        let prompt = self.prompt_for(&binding, &instruction);

        debug!(
            session = %session.id(),
            provider = self.provider.name(),
            model = self.provider.model_name(),
            "requesting completion"
        );
        let request = CompletionRequest::new(prompt.clone(), &self.params);
        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(error = %e, "completion failed");
            e
        })?;
        let completion = response.top_text()?.trim().to_string();

        let action = classify(&completion);
        debug!(?action, "classified completion");

        let (action, execution) = session.apply(generation, |undo| {
            self.perform(&binding, undo, &instruction, action)
        })?;

        Ok(Some(SubmitOutcome { prompt, completion, action, execution }))
    }

    fn perform(
        &self,
        binding: &Binding,
        undo: &mut UndoRecord,
        instruction: &str,
        action: Action,
    ) -> Result<(AppliedAction, Option<ExecutionHandle>), EngineError> {
        match action {
            Action::Undo => {
                let mut nb = lock_notebook(&binding.notebook);
                let restored = undo_cells(&mut *nb, undo)?;
                Ok((AppliedAction::Undo { restored }, None))
            }
            Action::RunAll => {
                let nb = lock_notebook(&binding.notebook);
                let handle = spawn_execution(binding, nb.id(), all_cells(&*nb));
                Ok((AppliedAction::RunAll, Some(handle)))
            }
            Action::RunActive => {
                let nb = lock_notebook(&binding.notebook);
                let handle = spawn_execution(binding, nb.id(), active_cell(&*nb));
                Ok((AppliedAction::RunActive, Some(handle)))
            }
            Action::Markdown(body) => {
                let mut nb = lock_notebook(&binding.notebook);
                let index = insert_after_active(&mut *nb, vec![Cell::documentation(body)])?;
                *undo = UndoRecord::inserted(1, index);
                info!(notebook = %nb.id(), index, "inserted documentation cell");
                Ok((AppliedAction::InsertedDocumentation { index }, None))
            }
            Action::Code(code) => {
                let mut nb = lock_notebook(&binding.notebook);
                let code_index = insert_after_active(
                    &mut *nb,
                    vec![Cell::documentation(format!("# {instruction}")), Cell::code(code.clone())],
                )?;
                *undo = UndoRecord::inserted(2, code_index);
                info!(notebook = %nb.id(), index = code_index, "inserted generated code");
                let execution = self.run_after_insert.then(|| {
                    let cells = vec![IndexedCell { index: code_index, cell: Cell::code(code) }];
                    spawn_execution(binding, nb.id(), cells)
                });
                Ok((
                    AppliedAction::InsertedCode { documentation_index: code_index - 1, code_index },
                    execution,
                ))
            }
        }
    }

    /// Revert the last insertion (or, with nothing recorded, delete the
    /// active cell) and return the instruction text of the removed
    /// `# instruction` cell, or an empty string.
    pub fn undo(&self, session: &Session) -> Result<String, EngineError> {
        let _guard = session.try_begin()?;
        let (binding, generation) = session.snapshot()?;
        session.apply(generation, |undo| {
            let mut nb = lock_notebook(&binding.notebook);
            undo_cells(&mut *nb, undo)
        })
    }

    /// Execute the active cell.
    pub fn run_active(&self, session: &Session) -> Result<Option<ExecutionHandle>, EngineError> {
        let (binding, _) = session.snapshot()?;
        let nb = lock_notebook(&binding.notebook);
        let cells = active_cell(&*nb);
        Ok((!cells.is_empty()).then(|| spawn_execution(&binding, nb.id(), cells)))
    }

    /// Execute every cell in order.
    pub fn run_all(&self, session: &Session) -> Result<Option<ExecutionHandle>, EngineError> {
        let (binding, _) = session.snapshot()?;
        let nb = lock_notebook(&binding.notebook);
        let cells = all_cells(&*nb);
        Ok((!cells.is_empty()).then(|| spawn_execution(&binding, nb.id(), cells)))
    }
}

// ─── Notebook edits ──────────────────────────────────────────────────────────

/// Insert `cells` right after the active cell (at the start of an empty
/// notebook) and move the cursor onto the last inserted cell, whose index is
/// returned.
fn insert_after_active(nb: &mut dyn Notebook, cells: Vec<Cell>) -> Result<usize, EngineError> {
    let start = if nb.is_empty() { 0 } else { (nb.active_index() + 1).min(nb.len()) };
    let mut index = start;
    for cell in cells {
        nb.insert_cell_at(index, cell)?;
        index += 1;
    }
    let last = index.saturating_sub(1);
    nb.set_active_index(last);
    Ok(last)
}

fn undo_cells(nb: &mut dyn Notebook, undo: &mut UndoRecord) -> Result<String, EngineError> {
    let mut restored = String::new();
    if nb.is_empty() {
        undo.clear();
        return Ok(restored);
    }

    if !undo.is_empty() && !undo.fits(nb.len()) {
        warn!(
            notebook = %nb.id(),
            inserted = undo.inserted,
            end = undo.end_index,
            len = nb.len(),
            "discarding undo record that does not match the notebook"
        );
        undo.clear();
        return Ok(restored);
    }

    match undo.start_index() {
        Some(start) => {
            let end = undo.end_index;
            let mut removed_count = 0;
            for index in (start..=end).rev() {
                let removed = nb.delete_cell_at(index)?;
                removed_count += 1;
                if let Some(text) = removed.instruction_text() {
                    restored = text.to_string();
                }
            }
            nb.set_active_index(undo.cursor_after_undo());
            debug!(notebook = %nb.id(), removed = removed_count, "undid last insertion");
            undo.clear();
        }
        None => {
            let index = nb.active_index().min(nb.len() - 1);
            let removed = nb.delete_cell_at(index)?;
            if let Some(text) = removed.instruction_text() {
                restored = text.to_string();
            }
            nb.set_active_index(index.saturating_sub(1));
            debug!(notebook = %nb.id(), index, "removed active cell");
        }
    }
    Ok(restored)
}

fn active_cell(nb: &dyn Notebook) -> Vec<IndexedCell> {
    if nb.is_empty() {
        return Vec::new();
    }
    let index = nb.active_index().min(nb.len() - 1);
    nb.cell(index)
        .map(|cell| vec![IndexedCell { index, cell }])
        .unwrap_or_default()
}

fn all_cells(nb: &dyn Notebook) -> Vec<IndexedCell> {
    nb.cells()
        .into_iter()
        .enumerate()
        .map(|(index, cell)| IndexedCell { index, cell })
        .collect()
}

/// Start `cells` on the binding's execution context.  Takes the notebook id
/// explicitly because callers still hold the notebook lock.
fn spawn_execution(binding: &Binding, notebook_id: &str, cells: Vec<IndexedCell>) -> ExecutionHandle {
    let execution = binding.execution.clone();
    let notebook_id = notebook_id.to_string();
    let task = tokio::spawn(async move {
        let result = execution.run_cells(&notebook_id, cells).await;
        if let Err(e) = &result {
            warn!(notebook = %notebook_id, error = %e, "cell execution failed");
        }
        result
    });
    ExecutionHandle { task }
}
