//! Project scaffolding from embedded templates

use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

pub const CONFIG_TEMPLATE: &str = "config.yaml.tera";
pub const CATALOG_TEMPLATE: &str = "catalog.yaml.tera";
pub const PAYLOAD_TEMPLATE: &str = "cotizacion.json.tera";

/// Values substituted into the scaffolding templates
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub product_id: String,
    pub margin: f64,
    pub catalog: String,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            product_id: "VC-2H".to_string(),
            margin: 30.0,
            catalog: "catalogo.yaml".to_string(),
        }
    }
}

impl TemplateContext {
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    fn to_tera(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("product_id", &self.product_id);
        context.insert("margin", &self.margin);
        context.insert("catalog", &self.catalog);
        context
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

impl TemplateGenerator {
    /// Create a new template generator with embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    fn render(&self, name: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, &ctx.to_tera())
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }

    pub fn generate_config(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.render(CONFIG_TEMPLATE, ctx)
    }

    pub fn generate_catalog(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.render(CATALOG_TEMPLATE, ctx)
    }

    pub fn generate_payload(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.render(PAYLOAD_TEMPLATE, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::entities::catalog::Catalog;
    use crate::entities::payload::QuotePayload;

    #[test]
    fn test_config_template_parses() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::default().with_margin(35.0);
        let config: Config = serde_yml::from_str(&generator.generate_config(&ctx).unwrap()).unwrap();
        assert_eq!(config.margin(), 35.0);
        assert_eq!(config.catalog.as_deref(), Some("catalogo.yaml"));
    }

    #[test]
    fn test_sample_catalog_is_clean() {
        let generator = TemplateGenerator::new().unwrap();
        let text = generator.generate_catalog(&TemplateContext::default()).unwrap();
        let catalog: Catalog = serde_yml::from_str(&text).unwrap();
        assert!(catalog.product("VC-2H").is_some());
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_sample_payload_matches_catalog() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::default();
        let payload: QuotePayload =
            serde_json::from_str(&generator.generate_payload(&ctx).unwrap()).unwrap();
        assert_eq!(payload.producto_id, ctx.product_id);
        assert_eq!(payload.margen_ganancia, Some(30.0));
    }
}
