//! Mesh (malla) cost aggregation
//!
//! Mesh cost is reporting on top of the material lines. A material that
//! contributes to mesh is counted in the material total and again in the
//! mesh subtotal, and the mesh total is added to the quote subtotal.
//! A line contributes when the mesh configuration lists it or when the
//! line itself is flagged.

use crate::entities::dimensions::Dimensions;
use crate::entities::mesh::MeshConfiguration;
use crate::entities::result::{LineOutcome, MeshBreakdown};

pub fn compute_mesh(
    rows: &[LineOutcome],
    config: &MeshConfiguration,
    dims: &Dimensions,
) -> MeshBreakdown {
    let material_subtotal: f64 = rows
        .iter()
        .filter(|row| row.contributes_to_mesh() || config.contributes(row.material_id()))
        .map(LineOutcome::importe)
        .fold(0.0, |acc, importe| acc + importe);

    let labor_subtotal = if config.includes_labor {
        dims.area() * config.labor_rate_per_area.unwrap_or(0.0)
    } else {
        0.0
    };

    MeshBreakdown {
        material_subtotal,
        labor_subtotal,
        total: material_subtotal + labor_subtotal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formula::FormulaError;
    use crate::entities::result::{FailedLine, MaterialCostRow, RowStatus};

    fn row(material_id: &str, importe: f64) -> LineOutcome {
        LineOutcome::Priced(MaterialCostRow {
            material_id: material_id.to_string(),
            name: material_id.to_string(),
            unit: None,
            formula: "1".to_string(),
            raw_quantity: 1.0,
            coverage_factor: 1.0,
            yield_quantity: 1.0,
            provider_id: Some("P".to_string()),
            variant_id: None,
            unit_price: importe,
            discount_percent: 0.0,
            variant_surcharge: 0.0,
            effective_price: importe,
            tax_percent: 0.0,
            tax_amount: 0.0,
            importe,
            malla: false,
            resolved: true,
            estado: RowStatus::Ok,
            error: None,
        })
    }

    #[test]
    fn test_sums_contributing_rows_only() {
        let rows = vec![row("MALLA", 100.0), row("ALU", 400.0), row("MARCO-M", 25.0)];
        let config = MeshConfiguration::default().with_materials(&["MALLA", "MARCO-M"]);
        let mesh = compute_mesh(&rows, &config, &Dimensions::new(1.0, 1.0).unwrap());

        assert!((mesh.material_subtotal - 125.0).abs() < 1e-10);
        assert_eq!(mesh.labor_subtotal, 0.0);
        assert!((mesh.total - 125.0).abs() < 1e-10);
    }

    #[test]
    fn test_flagged_line_counts_without_config_entry() {
        let mut flagged = row("MALLA", 100.0);
        flagged.mark_mesh();
        let rows = vec![flagged, row("ALU", 400.0)];
        let mesh = compute_mesh(&rows, &MeshConfiguration::default(), &Dimensions::new(1.0, 1.0).unwrap());

        assert!((mesh.material_subtotal - 100.0).abs() < 1e-10);
        assert!((mesh.total - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_subtotal_is_positive_zero() {
        let mesh = compute_mesh(&[], &MeshConfiguration::default(), &Dimensions::new(1.0, 1.0).unwrap());
        assert!(mesh.material_subtotal.is_sign_positive());
        assert!(mesh.total.is_sign_positive());
    }

    #[test]
    fn test_labor_by_area() {
        let config = MeshConfiguration::default().with_labor(40.0);
        let mesh = compute_mesh(&[], &config, &Dimensions::new(2.0, 1.5).unwrap());
        assert!((mesh.labor_subtotal - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_labor_flag_off_ignores_rate() {
        let mut config = MeshConfiguration::default().with_labor(40.0);
        config.includes_labor = false;
        let mesh = compute_mesh(&[], &config, &Dimensions::new(2.0, 1.5).unwrap());
        assert_eq!(mesh.labor_subtotal, 0.0);
    }

    #[test]
    fn test_failed_rows_contribute_nothing() {
        let failed = LineOutcome::Failed(FailedLine {
            material_id: "MALLA".to_string(),
            name: "Malla".to_string(),
            unit: None,
            formula: "x".to_string(),
            coverage_factor: 1.0,
            contributes_to_mesh: true,
            provider_id: None,
            variant_id: None,
            error: FormulaError::UnknownVariable("x".to_string()),
        });
        let config = MeshConfiguration::default().with_materials(&["MALLA"]);
        let mesh = compute_mesh(&[failed], &config, &Dimensions::new(1.0, 1.0).unwrap());
        assert_eq!(mesh.total, 0.0);
    }

    #[test]
    fn test_rows_are_not_mutated() {
        let rows = vec![row("MALLA", 100.0)];
        let before = rows.clone();
        let config = MeshConfiguration::default().with_materials(&["MALLA"]);
        compute_mesh(&rows, &config, &Dimensions::new(1.0, 1.0).unwrap());
        assert_eq!(rows, before);
    }
}
