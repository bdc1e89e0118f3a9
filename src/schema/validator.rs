//! Structural checks for catalogs and payloads
//!
//! Documents are checked against their embedded JSON schema after parsing
//! and before deserialization, so every structural mistake is reported at
//! once with a label on the offending key.

use jsonschema::error::ValidationErrorKind as Kind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::schema::registry::{DocumentKind, SchemaRegistry};

/// Schema violations in one document, with source locations
#[derive(Debug, Error, Diagnostic)]
#[error("{kind} does not match its schema: {summary}")]
#[diagnostic(code(cotizador::schema::invalid))]
pub struct SchemaError {
    kind: DocumentKind,

    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaError {
    pub fn new(
        kind: DocumentKind,
        filename: &str,
        source: &str,
        violations: Vec<SchemaViolation>,
    ) -> Self {
        let summary = match violations.len() {
            1 => "1 error".to_string(),
            n => format!("{} errors", n),
        };
        Self {
            kind,
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.message.as_str())
    }
}

/// Compiled schemas for every document kind
pub struct Validator {
    compiled: HashMap<DocumentKind, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for kind in DocumentKind::all() {
            let Some(schema_str) = registry.get(*kind) else {
                continue;
            };
            match serde_json::from_str::<JsonValue>(schema_str)
                .map_err(|e| e.to_string())
                .and_then(|json| validator_for(&json).map_err(|e| e.to_string()))
            {
                Ok(validator) => {
                    compiled.insert(*kind, validator);
                }
                Err(e) => tracing::warn!(%kind, error = %e, "schema failed to compile"),
            }
        }

        Self { compiled }
    }

    /// Check a parsed document, reporting every violation at once
    pub fn validate(
        &self,
        value: &JsonValue,
        content: &str,
        filename: &str,
        kind: DocumentKind,
    ) -> Result<(), SchemaError> {
        // No schema available - validation passes
        let Some(schema) = self.compiled.get(&kind) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(value)
            .map(|e| error_to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(kind, filename, content, violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let (message, hint, help) = describe(error);
    SchemaViolation {
        span: pointer_span(content, error.instance_path.as_str()),
        message,
        hint: hint.to_string(),
        help,
    }
}

/// Message, label and help for one violation
fn describe(error: &JsonSchemaError) -> (String, &'static str, Option<String>) {
    let at = match error.instance_path.as_str() {
        "" => "the top level".to_string(),
        path => format!("'{}'", path),
    };

    match &error.kind {
        Kind::Required { property } => {
            let field = plain(property);
            let help = field_help(&field)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Add '{}' here", field));
            (format!("{} is missing '{}'", at, field), "missing field", Some(help))
        }
        Kind::Type { kind } => (
            format!("{} has the wrong type (expected {:?})", at, kind),
            "wrong type",
            last_segment(error).and_then(field_help).map(str::to_string),
        ),
        Kind::Enum { options } => {
            let allowed = match options.as_array() {
                Some(values) => values.iter().map(plain).collect::<Vec<_>>().join(", "),
                None => plain(options),
            };
            (
                format!("{} must be one of: {}", at, allowed),
                "not allowed",
                Some(format!("Use one of: {}", allowed)),
            )
        }
        Kind::MinLength { .. } => (format!("{} must not be empty", at), "empty", None),
        Kind::Minimum { limit } => (
            format!("{} is below the minimum of {}", at, limit),
            "out of range",
            last_segment(error).and_then(field_help).map(str::to_string),
        ),
        Kind::Maximum { limit } => (
            format!("{} is above the maximum of {}", at, limit),
            "out of range",
            last_segment(error).and_then(field_help).map(str::to_string),
        ),
        _ => (format!("{}: {}", at, error), "invalid", None),
    }
}

/// Domain hints for fields people get wrong
fn field_help(field: &str) -> Option<&'static str> {
    Some(match field {
        "formula" => "Quantity formula over the opening, e.g. \"ancho * 2\" or \"si(malla = 1, area, 0)\"",
        "unit_price" => "Price of one purchase unit from this provider, before discount",
        "discount_percent" => "Provider discount as a percent between 0 and 100",
        "coverage_factor" => "Natural units one purchase unit covers, e.g. 6.1 for a 6.1 m bar",
        "rate_per_area" => "Labor price per square meter of opening",
        "dimensiones" => "Opening size in meters: { \"ancho\": 1.5, \"alto\": 1.2 }",
        "ancho" | "alto" => "Width and height are numbers in meters",
        "productoId" => "Id of a product in the catalog",
        _ => return None,
    })
}

fn last_segment<'e>(error: &'e JsonSchemaError) -> Option<&'e str> {
    error
        .instance_path
        .as_str()
        .rsplit('/')
        .find(|s| !s.is_empty() && s.parse::<usize>().is_err())
}

fn plain(value: &JsonValue) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Span for a JSON pointer in YAML or JSON text
///
/// Each named segment is searched for after the previous one, so
/// `/materials/0/offers/0/unit_price` lands inside `materials` rather than on
/// the first `unit_price` in the file. Index segments are skipped.
fn pointer_span(content: &str, pointer: &str) -> SourceSpan {
    let mut found = None;
    let mut from = 0;
    for segment in pointer
        .split('/')
        .filter(|s| !s.is_empty() && s.parse::<usize>().is_err())
    {
        match key_span_from(content, segment, from) {
            Some(span) => {
                from = span.offset() + span.len();
                found = Some(span);
            }
            None => break,
        }
    }

    found.unwrap_or_else(|| {
        let first_line = content.find('\n').unwrap_or(content.len()).max(1);
        (0, first_line).into()
    })
}

/// First line at or after `from` whose content starts with `key:` or `"key"`
fn key_span_from(content: &str, key: &str, from: usize) -> Option<SourceSpan> {
    let yaml_key = format!("{}:", key);
    let json_key = format!("\"{}\"", key);

    let mut line_start = 0;
    for line in content.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();
        if start + line.len() <= from {
            continue;
        }
        let text = line.trim_end_matches(['\n', '\r']);
        let body = text.trim_start().trim_start_matches("- ").trim_start_matches(['{', ' ']);
        if body.starts_with(&yaml_key) || body.starts_with(&json_key) {
            let key_at = start + (text.len() - body.len());
            if key_at >= from {
                return Some((key_at, body.len()).into());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str, kind: DocumentKind) -> Result<(), SchemaError> {
        let yaml: serde_yml::Value = serde_yml::from_str(content).unwrap();
        let value = serde_json::to_value(&yaml).unwrap();
        Validator::default().validate(&value, content, "test.yaml", kind)
    }

    #[test]
    fn test_validator_creation() {
        let validator = Validator::default();
        assert!(validator.compiled.contains_key(&DocumentKind::Catalog));
        assert!(validator.compiled.contains_key(&DocumentKind::Payload));
    }

    #[test]
    fn test_valid_catalog() {
        let yaml = r#"
products:
  - id: VC
    materials:
      - material_id: RIEL
        formula: ancho * 2
materials:
  - id: RIEL
    coverage_factor: 6
    offers:
      - provider_id: CUPRUM
        unit_price: 300
labor_rules:
  - type: fabrication
    rate_per_area: 100
"#;
        assert!(check(yaml, DocumentKind::Catalog).is_ok());
    }

    #[test]
    fn test_catalog_violations_are_collected() {
        let yaml = r#"
materials:
  - id: RIEL
    offers:
      - provider_id: CUPRUM
        discount_percent: 150
labor_rules:
  - type: pintura
    rate_per_area: 10
"#;
        let err = check(yaml, DocumentKind::Catalog).unwrap_err();
        assert_eq!(err.violation_count(), 3);
        assert!(err.messages().any(|m| m.contains("unit_price")));
        assert!(err.messages().any(|m| m.contains("fabrication")));
    }

    #[test]
    fn test_payload_missing_dimensions() {
        let json = r#"{ "productoId": "VC" }"#;
        let value: JsonValue = serde_json::from_str(json).unwrap();
        let err = Validator::default()
            .validate(&value, json, "payload.json", DocumentKind::Payload)
            .unwrap_err();
        assert!(err.messages().any(|m| m.contains("dimensiones")));
    }

    #[test]
    fn test_payload_wrong_type() {
        let json = "{\n  \"productoId\": \"VC\",\n  \"dimensiones\": { \"ancho\": \"uno\", \"alto\": 1 }\n}";
        let value: JsonValue = serde_json::from_str(json).unwrap();
        let err = Validator::default()
            .validate(&value, json, "payload.json", DocumentKind::Payload)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
    }

    #[test]
    fn test_key_span() {
        let content = "products:\n  - id: VC\n    name: Ventana\n";
        let span = key_span_from(content, "name", 0).unwrap();
        assert_eq!(span.offset(), 25);

        let json = "{\n  \"cantidad\": 2\n}";
        let span = key_span_from(json, "cantidad", 0).unwrap();
        assert_eq!(span.offset(), 4);
    }

    #[test]
    fn test_pointer_span_follows_nesting() {
        let content = "products:\n  - id: VC\n    name: Ventana\nmaterials:\n  - id: RIEL\n    name: Riel\n";
        let span = pointer_span(content, "/materials/0/name");
        assert_eq!(span.offset(), content.rfind("name").unwrap());

        // Unknown keys fall back to the first line
        let span = pointer_span(content, "/labor_rules/0");
        assert_eq!(span.offset(), 0);
    }
}
