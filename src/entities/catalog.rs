//! Catalog - products, materials, labor rules and mesh setup
//!
//! The catalog is the fabricator's setup data as exported by the
//! administration side. [`Catalog::build_request`] resolves a
//! [`QuotePayload`] against it into an immutable [`PricingRequest`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::error::{ConfigurationError, PricingError, ValidationError};
use crate::core::formula::Formula;
use crate::entities::labor::LaborRule;
use crate::entities::material::{MaterialLine, ProviderOffer, Selection};
use crate::entities::mesh::MeshConfiguration;
use crate::entities::payload::QuotePayload;
use crate::entities::request::{PricingPolicy, PricingRequest, QuoteLine};

/// Material attached to a product, with its quantity formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMaterial {
    pub material_id: String,

    pub formula: String,

    /// Overrides the material's coverage factor for this product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_factor: Option<f64>,
}

/// A quotable product (window or door model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Product type id used by labor rule filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    #[serde(default)]
    pub materials: Vec<ProductMaterial>,
}

/// A purchasable material and its provider offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Natural units covered by one purchase unit
    #[serde(default = "default_coverage_factor")]
    pub coverage_factor: f64,

    #[serde(default)]
    pub offers: Vec<ProviderOffer>,
}

fn default_coverage_factor() -> f64 {
    1.0
}

impl Material {
    pub fn offer(&self, provider_id: &str) -> Option<&ProviderOffer> {
        self.offers.iter().find(|o| o.provider_id == provider_id)
    }
}

/// Complete pricing setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub materials: Vec<Material>,

    #[serde(default)]
    pub labor_rules: Vec<LaborRule>,

    #[serde(default)]
    pub mesh: MeshConfiguration,
}

impl Catalog {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Resolve a payload into a pricing request
    ///
    /// Provider ids the material does not offer become unresolved
    /// selections (priced at 0 and flagged); the engine applies `policy`
    /// to them. A product referencing a material missing from the catalog
    /// is a configuration error.
    pub fn build_request(
        &self,
        payload: &QuotePayload,
        default_margin: f64,
        policy: PricingPolicy,
    ) -> Result<PricingRequest, PricingError> {
        let product = self
            .product(&payload.producto_id)
            .ok_or_else(|| ValidationError::UnknownProduct(payload.producto_id.clone()))?;
        payload.dimensiones.validate()?;

        let mut request = PricingRequest::new(product.id.clone(), payload.dimensiones);
        request.product_name = product.name.clone();
        request.product_type = product.product_type.clone();
        request.with_mesh = payload.malla;
        request.variables = payload.variables.clone();
        request.mesh = self.mesh.clone();
        request.labor_rules = self.labor_rules.clone();
        request.margin_percent = payload.margen_ganancia.unwrap_or(default_margin);
        request.quantity = payload.cantidad;
        request.policy = policy;

        for pm in &product.materials {
            let material =
                self.material(&pm.material_id)
                    .ok_or_else(|| ConfigurationError::UnknownMaterial {
                        product_id: product.id.clone(),
                        material_id: pm.material_id.clone(),
                    })?;

            let line = MaterialLine {
                material_id: material.id.clone(),
                name: if material.name.is_empty() {
                    material.id.clone()
                } else {
                    material.name.clone()
                },
                unit: material.unit.clone(),
                formula: pm.formula.clone(),
                coverage_factor: pm.coverage_factor.unwrap_or(material.coverage_factor),
                contributes_to_mesh: self.mesh.contributes(&material.id),
            };

            let requested = payload.selecciones.proveedores.get(&material.id).cloned();
            let mut selection = match requested
                .as_deref()
                .and_then(|provider_id| material.offer(provider_id))
            {
                Some(offer) => Selection::resolved(offer.clone()),
                None => Selection::unresolved(requested),
            };
            selection.variant_id = payload.selecciones.variantes.get(&material.id).cloned();

            request.lines.push(QuoteLine { line, selection });
        }

        Ok(request)
    }

    /// Every configuration problem in the catalog
    pub fn validate(&self) -> Vec<ConfigurationError> {
        let mut problems = Vec::new();

        for material in &self.materials {
            if !(material.coverage_factor.is_finite() && material.coverage_factor > 0.0) {
                problems.push(ConfigurationError::InvalidCoverageFactor {
                    material_id: material.id.clone(),
                    factor: material.coverage_factor,
                });
            }

            let mut seen = HashSet::new();
            for offer in &material.offers {
                if !seen.insert(offer.provider_id.as_str()) {
                    problems.push(ConfigurationError::DuplicateOffer {
                        material_id: material.id.clone(),
                        provider_id: offer.provider_id.clone(),
                    });
                }
                if let Err(e) = offer.validate(&material.id) {
                    problems.push(e);
                }
            }
        }

        for product in &self.products {
            for pm in &product.materials {
                if self.material(&pm.material_id).is_none() {
                    problems.push(ConfigurationError::UnknownMaterial {
                        product_id: product.id.clone(),
                        material_id: pm.material_id.clone(),
                    });
                }
                if let Some(factor) = pm.coverage_factor {
                    if !(factor.is_finite() && factor > 0.0) {
                        problems.push(ConfigurationError::InvalidCoverageFactor {
                            material_id: pm.material_id.clone(),
                            factor,
                        });
                    }
                }
                if let Err(source) = Formula::parse(&pm.formula) {
                    problems.push(ConfigurationError::InvalidFormula {
                        product_id: product.id.clone(),
                        material_id: pm.material_id.clone(),
                        source,
                    });
                }
            }
        }

        for (index, rule) in self.labor_rules.iter().enumerate() {
            if let Err(e) = rule.validate(index) {
                problems.push(e);
            }
        }

        if let Err(e) = self.mesh.validate() {
            problems.push(e);
        }

        problems
    }
}
