// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Prompt templates: the preamble and worked examples attached to the first
//! documentation cell of every transcript.
//!
//! Templates are plain text files.  Everything above the first line starting
//! with `-----` is the preamble; everything below it is examples, with code
//! fences dropped and blank lines removed.  A template repository is a JSON
//! index listing template files relative to its `base_url`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_PREFIX: &str = r###"# Generate code for Jupyter notebooks
I start with an empty jupyter notebook with Python 3 kernel, and incrementally add instructions for each cell. The instructions are comment string starts with "##" (with additional details are provided as quoted with """) the lines after the instructions or details should be a generated executable Python 3 code block or empty.
The instructions are given by a human via a speech-to-text program in a noisy environment, therefore the text maybe confusing and requires correction but the general context is using python for data analysis.
The result of each code block should be printed or displayed in the notebook.

In the following cases, it should generate a special command string instead of a python code block:
 - To cancel or undo last cell, generate "%undo"
 - To execute all the cells, generate "%run-all"
 - To execute the current or active cell, generate "%run""###;

const DEFAULT_EXAMPLES: &str = "## Print hello world\nprint(\"Hello world\")";

const SECTION_SEPARATOR: &str = "-----";
const CODE_FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url}: server returned {status}")]
    Status { url: String, status: u16 },

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing template repository index: {0}")]
    Index(#[from] serde_json::Error),

    #[error("no template named {0:?} in the repository")]
    UnknownTemplate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub prefix: String,
    pub examples: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { prefix: DEFAULT_PREFIX.into(), examples: DEFAULT_EXAMPLES.into() }
    }
}

impl PromptTemplate {
    pub fn new(prefix: impl Into<String>, examples: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), examples: examples.into() }
    }

    /// Parse a template file body.
    pub fn parse(text: &str) -> Self {
        let mut prefix = String::new();
        let mut examples = String::new();
        let mut in_examples = false;

        for line in text.lines() {
            if !in_examples {
                if line.starts_with(SECTION_SEPARATOR) {
                    in_examples = true;
                    continue;
                }
                prefix.push_str(line);
                prefix.push('\n');
            } else {
                let line = line.replace(CODE_FENCE, "");
                if !line.trim().is_empty() {
                    examples.push_str(&line);
                    examples.push('\n');
                }
            }
        }

        Self {
            prefix: prefix.trim().to_string(),
            examples: examples.trim().to_string(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }
}

// ─── Repository ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub name: String,
    /// Location relative to the repository `base_url`.
    pub source: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRepository {
    pub base_url: String,
    pub items: Vec<TemplateEntry>,
}

impl TemplateRepository {
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up an entry by name or source path.
    pub fn find(&self, key: &str) -> Option<&TemplateEntry> {
        self.items.iter().find(|e| e.name == key || e.source == key)
    }

    /// Full location of a template: `base_url` without its trailing `/`,
    /// joined with `source`.
    pub fn location_of(&self, source: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), source)
    }

    /// Load the repository index from an http(s) URL or a local path.
    pub async fn load(client: &reqwest::Client, location: &str) -> Result<Self, TemplateError> {
        let body = read_location(client, location).await?;
        Self::from_json(&body)
    }

    /// Fetch and parse the template registered under `key`.
    pub async fn fetch_template(
        &self,
        client: &reqwest::Client,
        key: &str,
    ) -> Result<PromptTemplate, TemplateError> {
        let entry = self
            .find(key)
            .ok_or_else(|| TemplateError::UnknownTemplate(key.to_string()))?;
        let location = self.location_of(&entry.source);
        debug!(template = %entry.name, %location, "fetching prompt template");
        let body = read_location(client, &location).await?;
        Ok(PromptTemplate::parse(&body))
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

async fn read_location(client: &reqwest::Client, location: &str) -> Result<String, TemplateError> {
    if !is_remote(location) {
        let path = location.strip_prefix("file://").unwrap_or(location);
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError::Io { path: path.to_string(), source });
    }

    let http_err = |source| TemplateError::Http { url: location.to_string(), source };
    let resp = client.get(location).send().await.map_err(http_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(TemplateError::Status { url: location.to_string(), status: status.as_u16() });
    }
    resp.text().await.map_err(http_err)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Built-in template ────────────────────────────────────────────────────

    #[test]
    fn default_template_lists_special_commands() {
        let t = PromptTemplate::default();
        assert!(t.prefix.starts_with("# Generate code for Jupyter notebooks"));
        for cmd in ["%undo", "%run-all", "%run"] {
            assert!(t.prefix.contains(cmd), "preamble must mention {cmd}");
        }
        assert_eq!(t.examples, "## Print hello world\nprint(\"Hello world\")");
    }

    #[test]
    fn default_preamble_is_complete() {
        let t = PromptTemplate::default();
        assert!(t.prefix.contains(r###"comment string starts with "##" (with additional details"###));
        assert!(t.prefix.contains(r#"quoted with """)"#));
        assert!(t.prefix.ends_with(r#"generate "%run""#));
        assert_eq!(t.prefix.lines().count(), 9);
    }

    // ── Parsing ──────────────────────────────────────────────────────────────

    #[test]
    fn parse_splits_on_separator_and_strips_fences() {
        let text = "Prefix line one\nPrefix line two\n\n----------\n```python\n## Load data\n\nimport pandas as pd\n```\n";
        let t = PromptTemplate::parse(text);
        assert_eq!(t.prefix, "Prefix line one\nPrefix line two");
        assert_eq!(t.examples, "python\n## Load data\nimport pandas as pd");
    }

    #[test]
    fn parse_without_separator_is_all_prefix() {
        let t = PromptTemplate::parse("  Only a preamble  \n");
        assert_eq!(t.prefix, "Only a preamble");
        assert!(t.examples.is_empty());
    }

    #[test]
    fn from_file_reads_and_parses() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "P\n-----\n## Ex\nx = 1\n").unwrap();
        let t = PromptTemplate::from_file(f.path()).unwrap();
        assert_eq!(t, PromptTemplate::new("P", "## Ex\nx = 1"));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = PromptTemplate::from_file(Path::new("/nonexistent/tpl.md")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }

    // ── Repository ───────────────────────────────────────────────────────────

    const INDEX: &str = r#"{
        "base_url": "https://example.com/prompts/",
        "items": [
            {"name": "Data analysis", "source": "data.md", "description": "pandas"},
            {"name": "Imaging", "source": "imaging/scikit.md"}
        ]
    }"#;

    #[test]
    fn repository_index_parses_and_finds_by_name_or_source() {
        let repo = TemplateRepository::from_json(INDEX).unwrap();
        assert_eq!(repo.items.len(), 2);
        assert_eq!(repo.find("Imaging").unwrap().source, "imaging/scikit.md");
        assert_eq!(repo.find("data.md").unwrap().name, "Data analysis");
        assert!(repo.find("missing").is_none());
        assert_eq!(repo.items[1].description, "");
    }

    #[test]
    fn location_joins_without_double_slash() {
        let repo = TemplateRepository::from_json(INDEX).unwrap();
        assert_eq!(repo.location_of("data.md"), "https://example.com/prompts/data.md");
    }

    #[test]
    fn malformed_index_is_rejected() {
        assert!(matches!(
            TemplateRepository::from_json("{\"items\": 3}"),
            Err(TemplateError::Index(_))
        ));
    }

    #[tokio::test]
    async fn local_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tpl.md"), "Local preamble\n-----\n## Ex\nprint(1)\n").unwrap();
        let index = serde_json::json!({
            "base_url": dir.path().display().to_string(),
            "items": [{"name": "local", "source": "tpl.md"}]
        });
        let index_path = dir.path().join("index.json");
        std::fs::write(&index_path, index.to_string()).unwrap();

        let client = reqwest::Client::new();
        let repo = TemplateRepository::load(&client, &index_path.display().to_string())
            .await
            .unwrap();
        let t = repo.fetch_template(&client, "local").await.unwrap();
        assert_eq!(t, PromptTemplate::new("Local preamble", "## Ex\nprint(1)"));

        let err = repo.fetch_template(&client, "nope").await.unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTemplate(_)));
    }
}
