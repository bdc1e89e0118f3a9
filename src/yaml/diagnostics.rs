//! Document syntax diagnostics
//!
//! Catalogs and payloads are YAML or JSON. Both parsers report a 1-based
//! line and column; the diagnostic points miette at that byte and adds a
//! hint for the mistakes people actually make when editing these files.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Hints keyed by a fragment of the parser's message (lower-case)
const HINTS: &[(&str, &str)] = &[
    ("trailing comma", "JSON does not allow a comma after the last item"),
    ("key must be a string", "JSON keys need double quotes: \"ancho\": 1.5"),
    ("expected `,` or `}`", "A comma is probably missing between two fields"),
    ("expected ','", "Separate list items with commas: [MALLA-FV, MARCO-MALLA]"),
    ("eof while parsing", "The document ends early; check for an unclosed { or ["),
    ("tab", "Indent with spaces; YAML rejects tab characters"),
    ("duplicate", "A key appears twice in the same mapping; keep one"),
    ("mapping values are not allowed", "Quote formulas that contain ':' and check indentation"),
    ("expected block end", "Indentation is inconsistent around this line"),
    ("did not find expected", "Check that every '- ' list item lines up under its parent"),
];

/// Parse failure in a catalog or payload, with its source location
#[derive(Debug, Error, Diagnostic)]
#[error("syntax error in {filename}: {message}")]
#[diagnostic(code(cotizador::document::syntax))]
pub struct SyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    hint: Option<String>,

    filename: String,

    message: String,
}

impl SyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map_or((1, 1), |loc| (loc.line(), loc.column()));
        Self::new(err.to_string(), source, filename, line, column)
    }

    pub fn from_json_error(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        Self::new(err.to_string(), source, filename, err.line(), err.column())
    }

    /// Error pointing at `line:column` (1-based; 0 is treated as 1)
    pub fn new(
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
    ) -> Self {
        let message = message.into();
        let offset = byte_offset(source, line.max(1), column.max(1));
        let hint = hint_for(&message).map(str::to_string);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: (offset, usize::from(offset < source.len())).into(),
            hint,
            filename: filename.to_string(),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Byte offset of a 1-based line and column, clamped to the source
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    if line_start >= source.len() {
        return source.len();
    }

    let rest = &source[line_start..];
    let line_text = rest.split('\n').next().unwrap_or(rest);
    let within = line_text
        .char_indices()
        .nth(column - 1)
        .map_or(line_text.len(), |(i, _)| i);
    line_start + within
}

fn hint_for(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| *hint)
}
