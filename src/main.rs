// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod chat;
mod cli;
mod workspace;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use nbchat_config::Config;
use nbchat_core::TemplateRepository;
use workspace::Workspace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Needs no configuration
    if let Commands::Completions { shell } = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let mut config = nbchat_config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    match &cli.command {
        Commands::Completions { .. } => {}
        Commands::ShowConfig => {
            println!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Templates { repository } => {
            let location = repository.as_deref().unwrap_or(&config.prompt.repository_url);
            list_templates(location).await?;
        }
        Commands::Submit { notebook, instruction } => {
            let ws = Workspace::open(&config, notebook).await?;
            ws.submit(&instruction.join(" ")).await?;
        }
        Commands::Undo { notebook } => {
            Workspace::open(&config, notebook).await?.undo()?;
        }
        Commands::Prompt { notebook, instruction } => {
            let ws = Workspace::open(&config, notebook).await?;
            ws.print_prompt(&instruction.join(" "))?;
        }
        Commands::Chat { notebook } => {
            let ws = Workspace::open(&config, notebook).await?;
            chat::run(&ws).await?;
        }
    }
    Ok(())
}

/// Command-line flags win over every config layer.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if let Some(path) = &cli.template_file {
        config.prompt.template_file = Some(path.display().to_string());
    }
    if let Some(name) = &cli.template {
        config.prompt.template = Some(name.clone());
    }
}

async fn list_templates(location: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let repo = TemplateRepository::load(&client, location).await?;
    for item in &repo.items {
        if item.description.is_empty() {
            println!("{:<32} {}", item.name, item.source);
        } else {
            println!("{:<32} {}  ({})", item.name, item.source, item.description);
        }
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
