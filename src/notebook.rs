//! Notebook data model and the nbformat v4 decoder.
//!
//! The on-disk JSON is read into loose `Raw*` serde structs and then
//! converted into [`Cell`] and [`Output`] values, which is where mime
//! bundles are reduced to the single representation we can show.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::JutError;

const DEFAULT_LANGUAGE: &str = "python";
const SUPPORTED_NBFORMAT: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Code,
    Markdown,
    Raw,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Position in the notebook, 0-based.
    pub index: usize,
    pub kind: CellKind,
    pub source: String,
    pub execution_count: Option<u64>,
    pub outputs: Vec<Output>,
}

impl Cell {
    /// Same cell with its outputs dropped.
    pub fn without_outputs(&self) -> Self {
        Self {
            index: self.index,
            kind: self.kind,
            source: self.source.clone(),
            execution_count: self.execution_count,
            outputs: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Stream { name: String },
    ExecuteResult { execution_count: Option<u64> },
    DisplayData,
    Error { ename: String, evalue: String },
    Unknown(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputContent {
    /// Displayable text, highlighted with `syntax` when set.
    Text {
        text: String,
        syntax: Option<&'static str>,
    },
    Image {
        mime: String,
    },
    /// Rich content a terminal cannot show as-is (LaTeX, PDF, ...).
    Unsupported {
        mime: String,
    },
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub kind: OutputKind,
    pub content: OutputContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notebook {
    /// Kernel language, used to highlight code cells.
    pub language: String,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Copy)]
enum MimeRendering {
    Syntax(&'static str),
    Image,
    Unsupported,
}

/// Mime types in the order `display_data` bundles are searched.
const MIME_PREFERENCE: &[(&str, MimeRendering)] = &[
    ("text/html", MimeRendering::Syntax("html")),
    ("application/vnd.jupyter.widget-view+json", MimeRendering::Syntax("json")),
    ("application/x-ipynb+json", MimeRendering::Syntax("json")),
    ("application/vnd.geo+json", MimeRendering::Syntax("json")),
    ("application/geo+json", MimeRendering::Syntax("json")),
    ("application/vnd.plotly.v1+json", MimeRendering::Syntax("json")),
    ("application/vdom.v1+json", MimeRendering::Syntax("json")),
    ("application/json", MimeRendering::Syntax("json")),
    ("image/png", MimeRendering::Image),
    ("image/jpg", MimeRendering::Image),
    ("image/jpeg", MimeRendering::Image),
    ("image/gif", MimeRendering::Image),
    ("image/svg+xml", MimeRendering::Image),
    ("text/latex", MimeRendering::Unsupported),
    ("application/pdf", MimeRendering::Unsupported),
];

const PLAIN_TEXT_MIME: &str = "text/plain";

/// nbformat stores long strings either whole or split into lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl MultilineText {
    fn into_string(self) -> String {
        match self {
            Self::Single(text) => text,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    nbformat: u32,
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    language_info: Option<RawLanguageInfo>,
    #[serde(default)]
    kernelspec: Option<RawKernelSpec>,
}

#[derive(Debug, Deserialize)]
struct RawLanguageInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawKernelSpec {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: CellKind,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    execution_count: Option<u64>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    output_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<MultilineText>,
    #[serde(default)]
    data: BTreeMap<String, Value>,
    #[serde(default)]
    execution_count: Option<u64>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
    #[serde(default)]
    traceback: Vec<String>,
}

/// Decodes nbformat v4 JSON into a [`Notebook`].
pub fn decode(raw: &[u8]) -> Result<Notebook, JutError> {
    let notebook: RawNotebook =
        serde_json::from_slice(raw).map_err(|err| JutError::MalformedDocument(err.to_string()))?;

    if notebook.nbformat != SUPPORTED_NBFORMAT {
        return Err(JutError::MalformedDocument(format!(
            "unsupported nbformat version {} (expected {SUPPORTED_NBFORMAT})",
            notebook.nbformat
        )));
    }

    let language = resolve_language(&notebook.metadata);
    let cells = notebook
        .cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| convert_cell(index, cell))
        .collect();

    Ok(Notebook { language, cells })
}

fn resolve_language(metadata: &RawMetadata) -> String {
    let from_info = metadata
        .language_info
        .as_ref()
        .and_then(|info| info.name.as_deref());
    let from_kernel = metadata
        .kernelspec
        .as_ref()
        .and_then(|spec| spec.language.as_deref());

    from_info
        .or(from_kernel)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_ascii_lowercase()
}

fn convert_cell(index: usize, cell: RawCell) -> Cell {
    let outputs = if cell.kind_has_outputs() {
        cell.outputs.into_iter().map(convert_output).collect()
    } else {
        Vec::new()
    };
    Cell {
        index,
        kind: cell.cell_type,
        source: cell.source.into_string(),
        execution_count: cell.execution_count,
        outputs,
    }
}

impl RawCell {
    fn kind_has_outputs(&self) -> bool {
        self.cell_type == CellKind::Code
    }
}

fn convert_output(output: RawOutput) -> Output {
    match output.output_type.as_str() {
        "stream" => Output {
            kind: OutputKind::Stream {
                name: output.name.unwrap_or_else(|| "stdout".to_string()),
            },
            content: text_content(output.text.unwrap_or_default().into_string(), None),
        },
        "execute_result" => Output {
            kind: OutputKind::ExecuteResult {
                execution_count: output.execution_count,
            },
            content: pick_bundle(&output.data, true),
        },
        "display_data" => Output {
            kind: OutputKind::DisplayData,
            content: pick_bundle(&output.data, false),
        },
        "error" => {
            let ename = output.ename.unwrap_or_default();
            let evalue = output.evalue.unwrap_or_default();
            let text = if output.traceback.is_empty() {
                format!("{ename}: {evalue}")
            } else {
                output.traceback.join("\n")
            };
            Output {
                kind: OutputKind::Error { ename, evalue },
                content: text_content(text, None),
            }
        }
        other => Output {
            kind: OutputKind::Unknown(other.to_string()),
            content: OutputContent::Empty,
        },
    }
}

fn text_content(text: String, syntax: Option<&'static str>) -> OutputContent {
    if text.is_empty() {
        OutputContent::Empty
    } else {
        OutputContent::Text { text, syntax }
    }
}

/// Reduces a mime bundle to one displayable representation.
///
/// Results favour `text/plain`; display data favours the richer types in
/// [`MIME_PREFERENCE`] and only falls back to plain text.
fn pick_bundle(data: &BTreeMap<String, Value>, prefer_plain: bool) -> OutputContent {
    let plain = data.get(PLAIN_TEXT_MIME).map(bundle_value_text);
    if prefer_plain {
        if let Some(text) = plain.clone() {
            return text_content(text, None);
        }
    }

    for (mime, rendering) in MIME_PREFERENCE {
        let Some(value) = data.get(*mime) else {
            continue;
        };
        return match rendering {
            MimeRendering::Syntax(token) => text_content(bundle_value_text(value), Some(*token)),
            MimeRendering::Image => OutputContent::Image {
                mime: (*mime).to_string(),
            },
            MimeRendering::Unsupported => OutputContent::Unsupported {
                mime: (*mime).to_string(),
            },
        };
    }

    if let Some(text) = plain {
        return text_content(text, None);
    }

    match data.keys().next() {
        Some(mime) => OutputContent::Unsupported { mime: mime.clone() },
        None => OutputContent::Empty,
    }
}

fn bundle_value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .concat(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
