// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::workspace::Workspace;

/// One line typed into the chat loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatLine<'a> {
    Instruction(&'a str),
    Undo,
    Run,
    RunAll,
    Prompt(&'a str),
    Quit,
    Unknown(&'a str),
}

impl<'a> ChatLine<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(ChatLine::Instruction(line));
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));
        Some(match name {
            "undo" => ChatLine::Undo,
            "run" => ChatLine::Run,
            "run-all" => ChatLine::RunAll,
            "prompt" => ChatLine::Prompt(rest),
            "quit" | "exit" => ChatLine::Quit,
            _ => ChatLine::Unknown(name),
        })
    }
}

/// Read instructions from stdin until EOF or `/quit`.  Errors are reported
/// and the loop continues.
pub async fn run(ws: &Workspace) -> anyhow::Result<()> {
    eprintln!(
        "editing {} (type an instruction, or /undo, /run, /run-all, /prompt TEXT, /quit)",
        ws.path().display()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(parsed) = ChatLine::parse(&line) else {
            continue;
        };
        debug!(?parsed, "chat input");
        let result = match parsed {
            ChatLine::Quit => break,
            ChatLine::Instruction(text) => ws.submit(text).await,
            ChatLine::Undo => ws.undo(),
            ChatLine::Run => ws.run(false).await,
            ChatLine::RunAll => ws.run(true).await,
            ChatLine::Prompt(text) => ws.print_prompt(text),
            ChatLine::Unknown(name) => {
                eprintln!("unknown command /{name}");
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("error: {e:#}");
        }
    }
    Ok(())
}
