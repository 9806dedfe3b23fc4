// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Serde model of the nbformat 4 JSON document.
//!
//! Only the fields the engine reads are typed.  Everything else (outputs,
//! attachments, execution counts, kernel metadata) is carried through
//! untouched in `extra` maps so a load/save cycle does not lose data.

use nbchat_core::{Cell, CellKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CODE: &str = "code";
pub const MARKDOWN: &str = "markdown";

/// Cell source: nbformat allows a single string or a list of lines that
/// keep their trailing `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Lines(Vec::new())
    }
}

impl Source {
    /// Split `text` the way Jupyter writes it: one entry per line, each but
    /// the last ending in `\n`.
    pub fn from_text(text: &str) -> Self {
        Source::Lines(text.split_inclusive('\n').map(str::to_string).collect())
    }

    pub fn text(&self) -> String {
        match self {
            Source::Text(s) => s.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    pub cell_type: String,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawCell {
    /// A fresh cell for `cell`.  `id` is required from nbformat 4.5 on.
    pub fn new(cell: &Cell, id: Option<String>) -> Self {
        let mut extra = Map::new();
        if let Some(id) = id {
            extra.insert("id".into(), Value::String(id));
        }
        let cell_type = match cell.kind {
            CellKind::Code => {
                extra.insert("execution_count".into(), Value::Null);
                extra.insert("outputs".into(), Value::Array(Vec::new()));
                CODE
            }
            CellKind::Documentation => MARKDOWN,
        };
        Self {
            cell_type: cell_type.into(),
            source: Source::from_text(&cell.text),
            metadata: Map::new(),
            extra,
        }
    }

    /// Engine view of the cell.  Markdown is documentation; code and any
    /// other kind (`raw`) are replayed verbatim as code.
    pub fn to_cell(&self) -> Cell {
        let text = self.source.text();
        if self.cell_type == MARKDOWN {
            Cell::documentation(text)
        } else {
            Cell::code(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNotebook {
    pub cells: Vec<RawCell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RawNotebook {
    fn default() -> Self {
        let mut metadata = Map::new();
        metadata.insert(
            "kernelspec".into(),
            serde_json::json!({
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            }),
        );
        metadata.insert("language_info".into(), serde_json::json!({ "name": "python" }));
        Self {
            cells: Vec::new(),
            metadata,
            nbformat: 4,
            nbformat_minor: 5,
            extra: Map::new(),
        }
    }
}

impl RawNotebook {
    /// Whether new cells need an `id` field.
    pub fn wants_cell_ids(&self) -> bool {
        self.nbformat > 4 || (self.nbformat == 4 && self.nbformat_minor >= 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_accepts_string_or_lines() {
        let s: Source = serde_json::from_str(r#""a\nb""#).unwrap();
        assert_eq!(s.text(), "a\nb");
        let l: Source = serde_json::from_str(r#"["a\n", "b"]"#).unwrap();
        assert_eq!(l.text(), "a\nb");
    }

    #[test]
    fn from_text_keeps_newlines_on_all_but_last() {
        assert_eq!(
            Source::from_text("x = 1\nprint(x)"),
            Source::Lines(vec!["x = 1\n".into(), "print(x)".into()])
        );
        assert_eq!(Source::from_text(""), Source::Lines(vec![]));
    }

    #[test]
    fn cell_kinds_map_to_engine_kinds() {
        let md: RawCell =
            serde_json::from_value(serde_json::json!({"cell_type": "markdown", "source": "# Hi"})).unwrap();
        assert_eq!(md.to_cell(), Cell::documentation("# Hi"));

        let raw: RawCell =
            serde_json::from_value(serde_json::json!({"cell_type": "raw", "source": ["%%raw"]})).unwrap();
        assert_eq!(raw.to_cell(), Cell::code("%%raw"));
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let json = serde_json::json!({
            "cell_type": "code",
            "execution_count": 3,
            "id": "abc",
            "metadata": {"tags": ["x"]},
            "outputs": [{"output_type": "stream", "name": "stdout", "text": ["hi\n"]}],
            "source": ["print('hi')"]
        });
        let cell: RawCell = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&cell).unwrap(), json);
    }

    #[test]
    fn new_code_cell_has_empty_outputs() {
        let c = RawCell::new(&Cell::code("x"), Some("id-1".into()));
        assert_eq!(c.cell_type, CODE);
        assert_eq!(c.extra["outputs"], serde_json::json!([]));
        assert_eq!(c.extra["execution_count"], Value::Null);
        assert_eq!(c.extra["id"], "id-1");

        let d = RawCell::new(&Cell::documentation("# Doc"), None);
        assert_eq!(d.cell_type, MARKDOWN);
        assert!(d.extra.is_empty());
    }

    #[test]
    fn cell_ids_from_minor_five() {
        let mut nb = RawNotebook::default();
        assert!(nb.wants_cell_ids());
        nb.nbformat_minor = 4;
        assert!(!nb.wants_cell_ids());
    }
}
