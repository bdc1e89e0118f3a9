//! Catalog and payload loading
//!
//! Documents are YAML or JSON (chosen by file extension). Each is parsed,
//! checked against its embedded schema, then deserialized, so a malformed
//! file is reported with its source span instead of a bare serde message.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::Path;

use crate::entities::catalog::Catalog;
use crate::entities::payload::QuotePayload;
use crate::schema::{DocumentKind, Validator};
use crate::yaml::SyntaxError;

/// Path that stands for standard input
pub const STDIN_PATH: &str = "-";

/// Surface syntax of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else (including stdin) is YAML,
    /// which also accepts JSON text
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse, schema-check and deserialize a document
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    filename: &str,
    format: DocumentFormat,
    kind: DocumentKind,
) -> Result<T> {
    let value: JsonValue = match format {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| SyntaxError::from_json_error(&e, content, filename))?,
        DocumentFormat::Yaml => {
            let yaml: serde_yml::Value = serde_yml::from_str(content)
                .map_err(|e| SyntaxError::from_serde_error(&e, content, filename))?;
            serde_json::to_value(yaml).into_diagnostic()?
        }
    };

    Validator::default().validate(&value, content, filename, kind)?;

    serde_json::from_value(value)
        .map_err(|e| miette::miette!("{} '{}' could not be read: {}", kind, filename, e))
}

/// Load a document from a path, or from stdin when the path is `-`
pub fn load_document<T: DeserializeOwned>(path: &Path, kind: DocumentKind) -> Result<T> {
    let (content, filename) = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        (buf, "<stdin>".to_string())
    } else {
        let content = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("cannot read {} '{}': {}", kind, path.display(), e))?;
        (content, path.display().to_string())
    };

    tracing::debug!(%kind, file = %filename, bytes = content.len(), "loading document");
    parse_document(&content, &filename, DocumentFormat::from_path(path), kind)
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    load_document(path, DocumentKind::Catalog)
}

pub fn load_payload(path: &Path) -> Result<QuotePayload> {
    load_document(path, DocumentKind::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CATALOG: &str = r#"
products:
  - id: VF
    name: Ventana fija
    materials:
      - material_id: VIDRIO
        formula: area
materials:
  - id: VIDRIO
    offers:
      - provider_id: VITRO
        unit_price: 400
"#;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("-")), DocumentFormat::Yaml);
    }

    #[test]
    fn test_load_yaml_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalogo.yaml");
        fs::write(&path, CATALOG).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.products[0].id, "VF");
        assert_eq!(catalog.materials[0].coverage_factor, 1.0);
    }

    #[test]
    fn test_load_json_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cotizacion.json");
        fs::write(
            &path,
            r#"{ "productoId": "VF", "dimensiones": { "ancho": 1, "alto": 2 } }"#,
        )
        .unwrap();

        let payload = load_payload(&path).unwrap();
        assert_eq!(payload.producto_id, "VF");
        assert_eq!(payload.cantidad, 1);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result: Result<QuotePayload> = parse_document(
            "{ \"productoId\": ",
            "p.json",
            DocumentFormat::Json,
            DocumentKind::Payload,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_schema_error_is_reported() {
        let result: Result<Catalog> = parse_document(
            "materials:\n  - id: X\n    offers:\n      - provider_id: P\n",
            "c.yaml",
            DocumentFormat::Yaml,
            DocumentKind::Catalog,
        );
        assert!(result.unwrap_err().to_string().contains("does not match its schema"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/catalogo.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read catalog"));
    }
}
