//! Labor cost rules
//!
//! A rule prices one kind of labor per square meter of opening. Rules can be
//! narrowed to product types and to products built with certain materials.
//!
//! When several active rules of the same type match a product, the most
//! specific one wins: a rule's specificity is the number of non-empty
//! filters it carries (0 = wildcard, 1 = product type *or* material,
//! 2 = both). Among equally specific rules the first in configuration order
//! wins.

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigurationError;

/// Kind of labor a rule prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaborType {
    Fabrication,
    Installation,
    Mesh,
}

impl std::fmt::Display for LaborType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaborType::Fabrication => write!(f, "fabrication"),
            LaborType::Installation => write!(f, "installation"),
            LaborType::Mesh => write!(f, "mesh"),
        }
    }
}

impl std::str::FromStr for LaborType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fabrication" | "fabricacion" => Ok(LaborType::Fabrication),
            "installation" | "instalacion" => Ok(LaborType::Installation),
            "mesh" | "malla" => Ok(LaborType::Mesh),
            _ => Err(format!("Unknown labor type: {}", s)),
        }
    }
}

/// Restricts where a rule applies; empty lists match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_types: Vec<String>,

    /// Rule applies when the product uses any of these materials
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub material_ids: Vec<String>,
}

impl Applicability {
    /// Number of non-empty filters
    pub fn specificity(&self) -> u8 {
        u8::from(!self.product_types.is_empty()) + u8::from(!self.material_ids.is_empty())
    }

    pub fn matches<'a>(
        &self,
        product_type: Option<&str>,
        mut material_ids: impl Iterator<Item = &'a str>,
    ) -> bool {
        let type_ok = self.product_types.is_empty()
            || product_type.is_some_and(|t| self.product_types.iter().any(|p| p == t));
        let material_ok = self.material_ids.is_empty()
            || material_ids.any(|m| self.material_ids.iter().any(|id| id == m));
        type_ok && material_ok
    }
}

/// Labor pricing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub labor_type: LaborType,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Cost per square meter of opening
    pub rate_per_area: f64,

    #[serde(default)]
    pub applicability: Applicability,
}

fn default_active() -> bool {
    true
}

impl LaborRule {
    pub fn new(labor_type: LaborType, rate_per_area: f64) -> Self {
        Self {
            id: None,
            labor_type,
            active: true,
            rate_per_area,
            applicability: Applicability::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn for_product_types(mut self, types: &[&str]) -> Self {
        self.applicability.product_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn for_materials(mut self, ids: &[&str]) -> Self {
        self.applicability.material_ids = ids.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Label used in messages: the id, or the position in the rule list
    pub fn label(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("#{}", index + 1))
    }

    pub fn validate(&self, index: usize) -> Result<(), ConfigurationError> {
        if !self.rate_per_area.is_finite() || self.rate_per_area < 0.0 {
            return Err(ConfigurationError::MalformedLaborRule {
                rule: self.label(index),
                reason: format!("rate_per_area {} must be zero or positive", self.rate_per_area),
            });
        }
        if self.applicability.product_types.iter().any(|t| t.trim().is_empty())
            || self.applicability.material_ids.iter().any(|m| m.trim().is_empty())
        {
            return Err(ConfigurationError::MalformedLaborRule {
                rule: self.label(index),
                reason: "applicability filter contains an empty id".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specificity() {
        let wildcard = LaborRule::new(LaborType::Fabrication, 10.0);
        let by_type = wildcard.clone().for_product_types(&["corrediza"]);
        let by_both = by_type.clone().for_materials(&["ALU-3"]);
        assert_eq!(wildcard.applicability.specificity(), 0);
        assert_eq!(by_type.applicability.specificity(), 1);
        assert_eq!(by_both.applicability.specificity(), 2);
    }

    #[test]
    fn test_applicability_matching() {
        let rule = LaborRule::new(LaborType::Installation, 5.0)
            .for_product_types(&["corrediza", "fija"])
            .for_materials(&["VID-6"]);
        let a = &rule.applicability;

        assert!(a.matches(Some("fija"), ["ALU-1", "VID-6"].into_iter()));
        assert!(!a.matches(Some("abatible"), ["VID-6"].into_iter()));
        assert!(!a.matches(Some("fija"), ["ALU-1"].into_iter()));
        assert!(!a.matches(None, ["VID-6"].into_iter()));
        assert!(Applicability::default().matches(None, std::iter::empty()));
    }

    #[test]
    fn test_rule_validation() {
        assert!(LaborRule::new(LaborType::Mesh, 0.0).validate(0).is_ok());
        let err = LaborRule::new(LaborType::Mesh, -3.0).validate(2).unwrap_err();
        assert!(err.to_string().contains("#3"));
        assert!(LaborRule::new(LaborType::Mesh, 1.0)
            .for_product_types(&[" "])
            .validate(0)
            .is_err());
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = "type: fabrication\nrate_per_area: 120\napplicability:\n  product_types: [corrediza]\n";
        let rule: LaborRule = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rule.labor_type, LaborType::Fabrication);
        assert!(rule.active);
        assert_eq!(rule.applicability.product_types, vec!["corrediza"]);
    }

    #[test]
    fn test_labor_type_from_str() {
        assert_eq!("instalacion".parse::<LaborType>().unwrap(), LaborType::Installation);
        assert_eq!("Mesh".parse::<LaborType>().unwrap(), LaborType::Mesh);
        assert!("pintura".parse::<LaborType>().is_err());
    }
}
