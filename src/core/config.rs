//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Project;
use crate::entities::request::{FormulaErrorPolicy, PricingPolicy, UnresolvedPolicy};

/// Decimals used when displaying money and quantities
pub const DEFAULT_DECIMALS: usize = 2;

/// Cotizador configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profit margin percent used when a payload has none
    pub default_margin: Option<f64>,

    /// What to do with a material line whose formula fails
    pub formula_errors: Option<FormulaErrorPolicy>,

    /// What to do with an unresolved provider selection
    pub unresolved_selections: Option<UnresolvedPolicy>,

    /// Every material must name a provider
    pub require_selections: Option<bool>,

    /// Display rounding
    pub decimals: Option<usize>,

    /// Default output format
    pub default_format: Option<String>,

    /// Catalog path, relative to the project root
    pub catalog: Option<String>,
}

impl Config {
    /// Load configuration for a known project (or none), merging every
    /// layer in priority order
    pub fn load_with(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/cotizador/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.cotizador/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    fn from_env() -> Config {
        let mut config = Config::default();
        if let Ok(margin) = std::env::var("COTIZADOR_MARGIN") {
            match margin.trim().parse::<f64>() {
                Ok(value) => config.default_margin = Some(value),
                Err(_) => tracing::warn!(value = %margin, "COTIZADOR_MARGIN is not a number"),
            }
        }
        if let Ok(strict) = std::env::var("COTIZADOR_STRICT") {
            if matches!(strict.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                config.apply_policy(PricingPolicy::strict());
            }
        }
        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cotizador")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.default_margin.is_some() {
            self.default_margin = other.default_margin;
        }
        if other.formula_errors.is_some() {
            self.formula_errors = other.formula_errors;
        }
        if other.unresolved_selections.is_some() {
            self.unresolved_selections = other.unresolved_selections;
        }
        if other.require_selections.is_some() {
            self.require_selections = other.require_selections;
        }
        if other.decimals.is_some() {
            self.decimals = other.decimals;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
    }

    /// Overwrite every policy key
    pub fn apply_policy(&mut self, policy: PricingPolicy) {
        self.formula_errors = Some(policy.formula_errors);
        self.unresolved_selections = Some(policy.unresolved_selections);
        self.require_selections = Some(policy.require_selections);
    }

    pub fn margin(&self) -> f64 {
        self.default_margin.unwrap_or(0.0)
    }

    pub fn decimals(&self) -> usize {
        self.decimals.unwrap_or(DEFAULT_DECIMALS)
    }

    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            formula_errors: self.formula_errors.unwrap_or_default(),
            unresolved_selections: self.unresolved_selections.unwrap_or_default(),
            require_selections: self.require_selections.unwrap_or(false),
        }
    }

    /// Catalog path from config, resolved against the project root
    pub fn catalog_path(&self, project: Option<&Project>) -> Option<PathBuf> {
        let configured = self.catalog.as_ref()?;
        let path = PathBuf::from(configured);
        match project {
            Some(p) if path.is_relative() => Some(p.root().join(path)),
            _ => Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.margin(), 0.0);
        assert_eq!(config.decimals(), 2);
        assert_eq!(config.policy(), PricingPolicy::default());
    }

    #[test]
    fn test_merge_later_wins() {
        let mut config: Config =
            serde_yml::from_str("default_margin: 30\nformula_errors: zero\ndecimals: 3\n").unwrap();
        let project: Config =
            serde_yml::from_str("default_margin: 25\nunresolved_selections: reject\n").unwrap();
        config.merge(project);

        assert_eq!(config.margin(), 25.0);
        assert_eq!(config.decimals(), 3);
        let policy = config.policy();
        assert_eq!(policy.formula_errors, FormulaErrorPolicy::Zero);
        assert_eq!(policy.unresolved_selections, UnresolvedPolicy::Reject);
        assert!(!policy.require_selections);
    }

    #[test]
    fn test_apply_strict_policy() {
        let mut config = Config::default();
        config.formula_errors = Some(FormulaErrorPolicy::Zero);
        config.apply_policy(PricingPolicy::strict());
        assert_eq!(config.policy(), PricingPolicy::strict());
    }

    #[test]
    fn test_project_config_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        std::fs::write(project.config_path(), "default_margin: 42\ncatalog: datos/catalogo.yaml\n")
            .unwrap();

        let config = Config::load_with(Some(&project));
        assert_eq!(config.catalog.as_deref(), Some("datos/catalogo.yaml"));
        assert_eq!(
            config.catalog_path(Some(&project)).unwrap(),
            project.root().join("datos/catalogo.yaml")
        );
    }
}
