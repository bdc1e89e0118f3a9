//! Embedded JSON schemas for catalog and payload documents

use rust_embed::Embed;
use std::collections::HashMap;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Kind of document the tool reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Catalog,
    Payload,
}

impl DocumentKind {
    pub fn all() -> &'static [DocumentKind] {
        &[DocumentKind::Catalog, DocumentKind::Payload]
    }

    pub fn schema_file(&self) -> &'static str {
        match self {
            DocumentKind::Catalog => "catalog.schema.json",
            DocumentKind::Payload => "payload.schema.json",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Catalog => write!(f, "catalog"),
            DocumentKind::Payload => write!(f, "payload"),
        }
    }
}

/// Schema sources keyed by document kind
pub struct SchemaRegistry {
    schemas: HashMap<DocumentKind, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        for kind in DocumentKind::all() {
            if let Some(file) = EmbeddedSchemas::get(kind.schema_file()) {
                if let Ok(text) = std::str::from_utf8(&file.data) {
                    schemas.insert(*kind, text.to_string());
                }
            }
        }
        Self { schemas }
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        self.schemas.get(&kind).map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
