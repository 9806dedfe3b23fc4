// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nbchat",
    about = "Turn plain-language instructions into Jupyter notebook cells",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (layered on top of auto-discovered ones)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Completion model to use, e.g. "gpt-3.5-turbo-instruct"
    #[arg(long, short = 'M', env = "NBCHAT_MODEL", global = true)]
    pub model: Option<String>,

    /// Prompt template file (overrides `prompt.template_file`)
    #[arg(long, value_name = "PATH", global = true)]
    pub template_file: Option<PathBuf>,

    /// Template name or source in the prompt repository (overrides `prompt.template`)
    #[arg(long, short = 't', value_name = "NAME", global = true)]
    pub template: Option<String>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one instruction and apply the model's reply to the notebook
    Submit {
        /// Notebook file (.ipynb); created if it does not exist
        notebook: PathBuf,
        /// The instruction, e.g. "load data.csv into a dataframe"
        #[arg(required = true, num_args = 1..)]
        instruction: Vec<String>,
    },
    /// Revert the last insertion (or delete the active cell)
    Undo {
        notebook: PathBuf,
    },
    /// Print the prompt an instruction would be sent with, without sending it
    Prompt {
        notebook: PathBuf,
        #[arg(required = true, num_args = 1..)]
        instruction: Vec<String>,
    },
    /// Read instructions from stdin, one per line.
    ///
    /// Lines starting with `/` are commands: /undo, /run, /run-all,
    /// /prompt TEXT and /quit.
    Chat {
        notebook: PathBuf,
    },
    /// List the templates available in the prompt repository
    Templates {
        /// Repository index URL or path (overrides `prompt.repository_url`)
        #[arg(long)]
        repository: Option<String>,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "nbchat", &mut std::io::stdout());
}
