//! Pricing engine
//!
//! Data flows one way: dimensions and selections feed the material lines,
//! the mesh aggregator reads the priced lines, labor reads dimensions and
//! product type, and the composer combines everything. Request-level
//! problems are returned as errors before any line is priced; row-level
//! problems are recorded on the result.

pub mod labor;
pub mod material;
pub mod mesh;
pub mod price;
pub mod totals;

pub use labor::{compute_labor, select_rule};
pub use material::{compute_material_line, MaterialCalculator};
pub use mesh::compute_mesh;
pub use price::resolve_price;
pub use totals::compose;

use crate::core::error::{PricingError, ValidationError};
use crate::entities::catalog::Catalog;
use crate::entities::labor::LaborType;
use crate::entities::mesh::MeshConfiguration;
use crate::entities::payload::QuotePayload;
use crate::entities::request::{PricingPolicy, PricingRequest, UnresolvedPolicy};
use crate::entities::result::PricingResult;

/// Price one product
///
/// Pure over its input: the same request always yields the same result.
pub fn price_quote(request: &PricingRequest) -> Result<PricingResult, PricingError> {
    let span = tracing::info_span!("price_quote", product = %request.product_id);
    let _enter = span.enter();

    totals::validate_inputs(request.margin_percent, request.quantity)?;
    request.dimensions.validate()?;
    request.validate_configuration()?;
    check_selections(request)?;
    let env = request.environment()?;

    let mut calculator = MaterialCalculator::new(&env, request.policy.formula_errors);
    let mut rows = calculator.compute_all(&request.lines)?;

    let material_ids: Vec<&str> = request.material_ids().collect();
    let product_type = request.product_type.as_deref();
    let fabrication = compute_labor(
        &request.labor_rules,
        &request.dimensions,
        product_type,
        LaborType::Fabrication,
        &material_ids,
    );
    let installation = compute_labor(
        &request.labor_rules,
        &request.dimensions,
        product_type,
        LaborType::Installation,
        &material_ids,
    );

    let mesh_config = effective_mesh(request, &material_ids);
    // Listed materials are flagged on their rows, so `malla` matches the subtotal
    for row in rows.iter_mut() {
        if mesh_config.contributes(row.material_id()) {
            row.mark_mesh();
        }
    }
    let mesh = compute_mesh(&rows, &mesh_config, &request.dimensions);

    let mut result = compose(
        &rows,
        fabrication,
        installation,
        mesh,
        request.margin_percent,
        request.quantity,
    )?;
    result.producto_id = request.product_id.clone();
    result.producto = request.product_name.clone();
    result.avisos = calculator.into_warnings();

    tracing::info!(
        estado = %result.estado,
        total = result.costos.total,
        warnings = result.avisos.len(),
        "quote priced"
    );

    Ok(result)
}

/// Resolve a payload against a catalog and price it
pub fn price_payload(
    catalog: &Catalog,
    payload: &QuotePayload,
    default_margin: f64,
    policy: PricingPolicy,
) -> Result<PricingResult, PricingError> {
    let request = catalog.build_request(payload, default_margin, policy)?;
    price_quote(&request)
}

fn check_selections(request: &PricingRequest) -> Result<(), ValidationError> {
    for quote_line in &request.lines {
        let selection = &quote_line.selection;
        let material_id = &quote_line.line.material_id;

        if request.policy.require_selections && selection.provider_id.is_none() {
            return Err(ValidationError::MissingSelection(material_id.clone()));
        }
        if request.policy.unresolved_selections == UnresolvedPolicy::Reject
            && selection.offer.is_none()
        {
            let reason = match selection.provider_id {
                Some(ref provider) => format!("provider '{}' does not offer it", provider),
                None => "no provider selected".to_string(),
            };
            return Err(ValidationError::UnresolvedSelection {
                material_id: material_id.clone(),
                reason,
            });
        }
    }
    Ok(())
}

/// Mesh configuration as applied to this request
///
/// Mesh labor is only charged when the opening gets a mesh. Without an
/// explicit rate, the best matching `mesh` labor rule supplies one.
fn effective_mesh(request: &PricingRequest, material_ids: &[&str]) -> MeshConfiguration {
    let mut config = request.mesh.clone();
    config.includes_labor = config.includes_labor && request.with_mesh;
    if config.includes_labor && config.labor_rate_per_area.is_none() {
        config.labor_rate_per_area = select_rule(
            &request.labor_rules,
            LaborType::Mesh,
            request.product_type.as_deref(),
            material_ids,
        )
        .map(|rule| rule.rate_per_area);
    }
    config
}
