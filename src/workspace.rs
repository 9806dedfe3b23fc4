// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! One notebook file opened for editing: the engine, a session bound to the
//! file-backed host, and the save step that persists cells and undo state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use nbchat_config::{Config, PromptConfig};
use nbchat_core::{
    ActionEngine, AppliedAction, Binding, ExecutionHandle, NoopExecution, PromptTemplate, Session,
    SharedNotebook, SubmitOutcome, TemplateRepository,
};
use nbchat_notebook::FileNotebook;
use tracing::{debug, warn};

pub struct Workspace {
    engine: ActionEngine,
    session: Session,
    notebook: Arc<Mutex<FileNotebook>>,
    path: PathBuf,
}

impl Workspace {
    pub async fn open(config: &Config, path: &Path) -> anyhow::Result<Self> {
        let provider = nbchat_model::from_config(&config.model)?;
        let template = resolve_template(&config.prompt).await?;
        let engine = ActionEngine::from_config(Arc::from(provider), template, config);

        let nb = FileNotebook::open_or_create(path)
            .with_context(|| format!("opening notebook {}", path.display()))?;
        let undo = nb.undo_record();
        let notebook = Arc::new(Mutex::new(nb));
        let shared: SharedNotebook = notebook.clone();

        let session = Session::bound(Binding::new(shared, Arc::new(NoopExecution)));
        session.restore_undo_record(undo);
        debug!(session = %session.id(), notebook = %path.display(), "workspace ready");

        Ok(Self { engine, session, notebook, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write cells, cursor and the pending undo record back to the file.
    pub fn save(&self) -> anyhow::Result<()> {
        // Session state before notebook, the same order the engine locks in.
        let undo = self.session.undo_record();
        let mut nb = self
            .notebook
            .lock()
            .map_err(|_| anyhow!("notebook state is poisoned"))?;
        nb.set_undo_record(undo);
        nb.save()?;
        Ok(())
    }

    pub async fn submit(&self, instruction: &str) -> anyhow::Result<()> {
        let Some(outcome) = self.engine.submit(&self.session, instruction).await? else {
            eprintln!("nothing to send: the instruction is empty");
            return Ok(());
        };
        let SubmitOutcome { completion, action, execution, .. } = outcome;

        match &action {
            AppliedAction::InsertedCode { code_index, .. } => {
                println!("{completion}");
                eprintln!("inserted code as cell {code_index}");
            }
            AppliedAction::InsertedDocumentation { index } => {
                eprintln!("inserted documentation as cell {index}");
            }
            AppliedAction::Undo { restored } => print_restored(restored),
            AppliedAction::RunActive => eprintln!("running the active cell"),
            AppliedAction::RunAll => eprintln!("running all cells"),
        }

        if !matches!(action, AppliedAction::RunActive | AppliedAction::RunAll) {
            self.save()?;
        }
        finish(execution).await;
        Ok(())
    }

    pub fn undo(&self) -> anyhow::Result<()> {
        let restored = self.engine.undo(&self.session)?;
        self.save()?;
        print_restored(&restored);
        Ok(())
    }

    pub async fn run(&self, all: bool) -> anyhow::Result<()> {
        let handle = if all {
            self.engine.run_all(&self.session)?
        } else {
            self.engine.run_active(&self.session)?
        };
        match handle {
            Some(h) => finish(Some(h)).await,
            None => eprintln!("the notebook is empty"),
        }
        Ok(())
    }

    pub fn print_prompt(&self, instruction: &str) -> anyhow::Result<()> {
        match self.engine.build_prompt(&self.session, instruction)? {
            Some(prompt) => {
                eprintln!("==== Request Prompt ====");
                print!("{prompt}");
            }
            None => eprintln!("nothing to send: the instruction is empty"),
        }
        Ok(())
    }
}

/// Undo hands the removed instruction back for editing; only its first line
/// is shown.
fn print_restored(restored: &str) {
    match restored.lines().next() {
        Some(line) if !line.is_empty() => println!("{line}"),
        _ => eprintln!("undone"),
    }
}

async fn finish(execution: Option<ExecutionHandle>) {
    if let Some(handle) = execution {
        if let Err(e) = handle.wait().await {
            warn!(error = %e, "execution did not complete");
            eprintln!("execution failed: {e}");
        }
    }
}

/// Local template file first, then the named repository template, then the
/// built-in one.
pub async fn resolve_template(prompt: &PromptConfig) -> anyhow::Result<PromptTemplate> {
    if let Some(path) = prompt.template_path() {
        debug!(path = %path.display(), "using local prompt template");
        return PromptTemplate::from_file(&path)
            .with_context(|| format!("loading prompt template {}", path.display()));
    }
    if let Some(name) = &prompt.template {
        let client = reqwest::Client::new();
        let repo = TemplateRepository::load(&client, &prompt.repository_url)
            .await
            .with_context(|| format!("loading template repository {}", prompt.repository_url))?;
        return repo
            .fetch_template(&client, name)
            .await
            .with_context(|| format!("fetching prompt template {name:?}"));
    }
    Ok(PromptTemplate::default())
}
