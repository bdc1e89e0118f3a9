//! Request-level pricing errors
//!
//! Row-level problems (a formula that fails for one material, an unresolved
//! provider) are collected as data on the result. The errors here abort the
//! whole request.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::formula::FormulaError;

/// Bad setup data in the catalog (not bad user input)
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ConfigurationError {
    #[error("material '{material_id}' has coverage factor {factor}; it must be greater than zero")]
    #[diagnostic(
        code(cotizador::config::coverage_factor),
        help("The coverage factor is how many natural units (m, m²) one purchase unit covers, e.g. 6 for a 6 m bar")
    )]
    InvalidCoverageFactor { material_id: String, factor: f64 },

    #[error("labor rule {rule} is malformed: {reason}")]
    #[diagnostic(code(cotizador::config::labor_rule))]
    MalformedLaborRule { rule: String, reason: String },

    #[error("mesh configuration is malformed: {0}")]
    #[diagnostic(code(cotizador::config::mesh))]
    MalformedMesh(String),

    #[error("offer '{provider_id}' for material '{material_id}' is malformed: {reason}")]
    #[diagnostic(code(cotizador::config::offer))]
    MalformedOffer {
        material_id: String,
        provider_id: String,
        reason: String,
    },

    #[error("material '{material_id}' lists provider '{provider_id}' more than once")]
    #[diagnostic(code(cotizador::config::duplicate_offer))]
    DuplicateOffer {
        material_id: String,
        provider_id: String,
    },

    #[error("product '{product_id}' material '{material_id}' has an invalid formula: {source}")]
    #[diagnostic(code(cotizador::config::formula))]
    InvalidFormula {
        product_id: String,
        material_id: String,
        #[source]
        source: FormulaError,
    },

    #[error("product '{product_id}' references unknown material '{material_id}'")]
    #[diagnostic(code(cotizador::config::unknown_material))]
    UnknownMaterial {
        product_id: String,
        material_id: String,
    },
}

/// Rejected user input
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("quantity must be a whole number of at least 1 (got {0})")]
    #[diagnostic(code(cotizador::validation::quantity))]
    InvalidQuantity(i64),

    #[error("profit margin must be zero or positive (got {0})")]
    #[diagnostic(code(cotizador::validation::margin))]
    InvalidMargin(f64),

    #[error("dimensions must be positive (ancho={width}, alto={height})")]
    #[diagnostic(code(cotizador::validation::dimensions))]
    InvalidDimensions { width: f64, height: f64 },

    #[error("unknown product '{0}'")]
    #[diagnostic(code(cotizador::validation::product))]
    UnknownProduct(String),

    #[error("no provider selected for material '{0}'")]
    #[diagnostic(
        code(cotizador::validation::missing_selection),
        help("Add the material to selecciones.proveedores, or disable require_selections")
    )]
    MissingSelection(String),

    #[error("selection for material '{material_id}' could not be resolved: {reason}")]
    #[diagnostic(
        code(cotizador::validation::unresolved_selection),
        help("Strict mode rejects quotes with unresolved providers")
    )]
    UnresolvedSelection { material_id: String, reason: String },

    #[error("variable '{0}' cannot override a built-in variable")]
    #[diagnostic(code(cotizador::validation::variable))]
    ReservedVariable(String),
}

/// Fatal pricing error
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum PricingError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),
}
