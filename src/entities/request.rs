//! Pricing request - the immutable input to the engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{ConfigurationError, ValidationError};
use crate::core::formula::Environment;
use crate::entities::dimensions::{Dimensions, BUILTIN_VARIABLES};
use crate::entities::labor::LaborRule;
use crate::entities::material::{MaterialLine, Selection};
use crate::entities::mesh::MeshConfiguration;

/// What to do with a material line whose formula fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaErrorPolicy {
    /// Keep the row as failed; the quote becomes invalid
    #[default]
    Reject,
    /// Substitute a quantity of 0 and warn
    Zero,
}

impl std::fmt::Display for FormulaErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormulaErrorPolicy::Reject => write!(f, "reject"),
            FormulaErrorPolicy::Zero => write!(f, "zero"),
        }
    }
}

impl std::str::FromStr for FormulaErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(FormulaErrorPolicy::Reject),
            "zero" => Ok(FormulaErrorPolicy::Zero),
            _ => Err(format!("Unknown formula error policy: {}", s)),
        }
    }
}

/// What to do with a material whose provider selection cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Price at 0, flag the row, keep going
    #[default]
    Warn,
    /// Reject the whole request
    Reject,
}

impl std::fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedPolicy::Warn => write!(f, "warn"),
            UnresolvedPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" => Ok(UnresolvedPolicy::Warn),
            "reject" => Ok(UnresolvedPolicy::Reject),
            _ => Err(format!("Unknown unresolved selection policy: {}", s)),
        }
    }
}

/// Caller-chosen handling of row-level problems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    #[serde(default)]
    pub formula_errors: FormulaErrorPolicy,

    #[serde(default)]
    pub unresolved_selections: UnresolvedPolicy,

    /// Every material line must name a provider
    #[serde(default)]
    pub require_selections: bool,
}

impl PricingPolicy {
    /// Reject anything incomplete
    pub fn strict() -> Self {
        Self {
            formula_errors: FormulaErrorPolicy::Reject,
            unresolved_selections: UnresolvedPolicy::Reject,
            require_selections: true,
        }
    }
}

/// A material line with its provider selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub line: MaterialLine,
    #[serde(default)]
    pub selection: Selection,
}

/// Everything needed to price one product
///
/// Built fresh per quote by the caller; the engine never reads anything
/// outside of this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub product_id: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    pub dimensions: Dimensions,

    /// Exposed to formulas as `malla`
    #[serde(default)]
    pub with_mesh: bool,

    /// Extra formula variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, f64>,

    /// Material lines in product order
    #[serde(default)]
    pub lines: Vec<QuoteLine>,

    #[serde(default)]
    pub mesh: MeshConfiguration,

    #[serde(default)]
    pub labor_rules: Vec<LaborRule>,

    pub margin_percent: f64,

    pub quantity: i64,

    #[serde(default)]
    pub policy: PricingPolicy,
}

impl PricingRequest {
    pub fn new(product_id: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: String::new(),
            product_type: None,
            dimensions,
            with_mesh: false,
            variables: BTreeMap::new(),
            lines: Vec::new(),
            mesh: MeshConfiguration::default(),
            labor_rules: Vec::new(),
            margin_percent: 0.0,
            quantity: 1,
            policy: PricingPolicy::default(),
        }
    }

    pub fn add_line(&mut self, line: MaterialLine, selection: Selection) {
        self.lines.push(QuoteLine { line, selection });
    }

    pub fn material_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(|l| l.line.material_id.as_str())
    }

    /// Formula environment: dimension variables plus caller variables
    pub fn environment(&self) -> Result<Environment, ValidationError> {
        let mut env = self.dimensions.environment(self.with_mesh);
        for (name, value) in &self.variables {
            let key = name.to_ascii_lowercase();
            if BUILTIN_VARIABLES.contains(&key.as_str()) {
                return Err(ValidationError::ReservedVariable(name.clone()));
            }
            env.insert(key, *value);
        }
        Ok(env)
    }

    /// Setup checks that abort the request before any line is priced
    pub fn validate_configuration(&self) -> Result<(), ConfigurationError> {
        for quote_line in &self.lines {
            quote_line.line.validate()?;
            if let Some(ref offer) = quote_line.selection.offer {
                offer.validate(&quote_line.line.material_id)?;
            }
        }
        for (index, rule) in self.labor_rules.iter().enumerate() {
            rule.validate(index)?;
        }
        self.mesh.validate()
    }
}
