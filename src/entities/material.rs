//! Material lines, provider offers and selections

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigurationError;

/// Extra charge for a material variant (color, finish, glass tint)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSurcharge {
    pub variant_id: String,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Absolute amount added to the unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<f64>,

    /// Percent of the unit price added to it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_percent: Option<f64>,
}

impl VariantSurcharge {
    /// Surcharge amount for a given base unit price
    pub fn amount(&self, unit_price: f64) -> f64 {
        match (self.additional_price, self.additional_percent) {
            (Some(price), _) => price,
            (None, Some(percent)) => unit_price * percent / 100.0,
            (None, None) => 0.0,
        }
    }
}

/// One provider's price for a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOffer {
    /// Provider id; selections reference offers by this key
    pub provider_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    pub unit_price: f64,

    /// Percent in [0, 100]
    #[serde(default)]
    pub discount_percent: f64,

    #[serde(default)]
    pub tax_percent: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSurcharge>,
}

impl ProviderOffer {
    pub fn new(provider_id: impl Into<String>, unit_price: f64) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_name: None,
            unit_price,
            discount_percent: 0.0,
            tax_percent: 0.0,
            variants: Vec::new(),
        }
    }

    pub fn with_discount(mut self, percent: f64) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_tax(mut self, percent: f64) -> Self {
        self.tax_percent = percent;
        self
    }

    pub fn with_variant(mut self, variant: VariantSurcharge) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn variant(&self, variant_id: &str) -> Option<&VariantSurcharge> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }

    /// Check price, discount, tax and surcharges are in range
    pub fn validate(&self, material_id: &str) -> Result<(), ConfigurationError> {
        let malformed = |reason: String| ConfigurationError::MalformedOffer {
            material_id: material_id.to_string(),
            provider_id: self.provider_id.clone(),
            reason,
        };

        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(malformed(format!("unit price {} is negative", self.unit_price)));
        }
        if !(0.0..=100.0).contains(&self.discount_percent) {
            return Err(malformed(format!(
                "discount {}% is outside 0-100",
                self.discount_percent
            )));
        }
        if !self.tax_percent.is_finite() || self.tax_percent < 0.0 {
            return Err(malformed(format!("tax {}% is negative", self.tax_percent)));
        }
        for variant in &self.variants {
            match (variant.additional_price, variant.additional_percent) {
                (Some(_), Some(_)) => {
                    return Err(malformed(format!(
                        "variant '{}' sets both additional_price and additional_percent",
                        variant.variant_id
                    )));
                }
                (Some(v), None) | (None, Some(v)) if !v.is_finite() || v < 0.0 => {
                    return Err(malformed(format!(
                        "variant '{}' has a negative surcharge",
                        variant.variant_id
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// One material attached to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub material_id: String,

    #[serde(default)]
    pub name: String,

    /// Purchase unit, for display ("barra", "m²", "pieza")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Quantity expression over the variable environment
    pub formula: String,

    /// Natural units covered by one purchase unit (e.g. meters per bar)
    pub coverage_factor: f64,

    /// Whether this line's cost is also reported under mesh
    #[serde(default)]
    pub contributes_to_mesh: bool,
}

impl MaterialLine {
    pub fn new(material_id: impl Into<String>, formula: impl Into<String>, coverage_factor: f64) -> Self {
        let material_id = material_id.into();
        Self {
            name: material_id.clone(),
            material_id,
            unit: None,
            formula: formula.into(),
            coverage_factor,
            contributes_to_mesh: false,
        }
    }

    /// Coverage factor must be finite and strictly positive
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.coverage_factor.is_finite() && self.coverage_factor > 0.0 {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidCoverageFactor {
                material_id: self.material_id.clone(),
                factor: self.coverage_factor,
            })
        }
    }
}

/// The chosen provider offer (and variant) for one material line
///
/// `offer` is `None` when the requested provider could not be resolved;
/// such a line prices at 0 and is flagged on the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Provider id as requested by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<ProviderOffer>,
}

impl Selection {
    pub fn resolved(offer: ProviderOffer) -> Self {
        Self {
            provider_id: Some(offer.provider_id.clone()),
            variant_id: None,
            offer: Some(offer),
        }
    }

    pub fn unresolved(provider_id: Option<String>) -> Self {
        Self {
            provider_id,
            variant_id: None,
            offer: None,
        }
    }

    pub fn with_variant(mut self, variant_id: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, price: Option<f64>, percent: Option<f64>) -> VariantSurcharge {
        VariantSurcharge {
            variant_id: id.to_string(),
            name: None,
            additional_price: price,
            additional_percent: percent,
        }
    }

    #[test]
    fn test_surcharge_amount() {
        assert_eq!(variant("blanco", Some(20.0), None).amount(100.0), 20.0);
        assert_eq!(variant("negro", None, Some(15.0)).amount(200.0), 30.0);
        assert_eq!(variant("natural", None, None).amount(200.0), 0.0);
    }

    #[test]
    fn test_offer_validation() {
        assert!(ProviderOffer::new("P1", 10.0).validate("M1").is_ok());
        assert!(ProviderOffer::new("P1", -1.0).validate("M1").is_err());
        assert!(ProviderOffer::new("P1", 10.0)
            .with_discount(120.0)
            .validate("M1")
            .is_err());
        assert!(ProviderOffer::new("P1", 10.0).with_tax(-5.0).validate("M1").is_err());
        assert!(ProviderOffer::new("P1", 10.0)
            .with_variant(variant("v", Some(1.0), Some(1.0)))
            .validate("M1")
            .is_err());
        assert!(ProviderOffer::new("P1", 10.0)
            .with_variant(variant("v", Some(-1.0), None))
            .validate("M1")
            .is_err());
    }

    #[test]
    fn test_coverage_factor_validation() {
        assert!(MaterialLine::new("M1", "ancho", 6.0).validate().is_ok());
        assert_eq!(
            MaterialLine::new("M1", "ancho", 0.0).validate(),
            Err(ConfigurationError::InvalidCoverageFactor {
                material_id: "M1".to_string(),
                factor: 0.0
            })
        );
        assert!(MaterialLine::new("M1", "ancho", -2.0).validate().is_err());
    }

    #[test]
    fn test_offer_yaml_defaults() {
        let yaml = "provider_id: ALU-01\nunit_price: 350.5\n";
        let offer: ProviderOffer = serde_yml::from_str(yaml).unwrap();
        assert_eq!(offer.discount_percent, 0.0);
        assert_eq!(offer.tax_percent, 0.0);
        assert!(offer.variants.is_empty());
    }
}
