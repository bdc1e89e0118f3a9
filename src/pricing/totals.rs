//! Quote totals

use crate::core::error::ValidationError;
use crate::entities::result::{
    Costs, LineOutcome, MeshBreakdown, PricingResult, QuoteStatus, RowStatus,
};

/// Reject a quantity below 1 or a negative or non-finite margin
pub fn validate_inputs(margin_percent: f64, quantity: i64) -> Result<u32, ValidationError> {
    if !margin_percent.is_finite() || margin_percent < 0.0 {
        return Err(ValidationError::InvalidMargin(margin_percent));
    }
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(ValidationError::InvalidQuantity(quantity))
}

/// Overall quote state from its rows
///
/// A failed row makes the quote invalid. Unresolved or substituted rows
/// leave it incomplete.
pub fn quote_status(rows: &[LineOutcome]) -> QuoteStatus {
    let mut status = QuoteStatus::Completa;
    for row in rows {
        match row {
            LineOutcome::Failed(_) => return QuoteStatus::Invalida,
            LineOutcome::Priced(r) if r.estado != RowStatus::Ok => {
                status = QuoteStatus::Incompleta
            }
            LineOutcome::Priced(_) => {}
        }
    }
    status
}

/// Combine line costs, labor and mesh into the final breakdown
///
/// ```text
/// subtotal = Σ importe + fabrication + installation + mesh.total
/// ganancia = subtotal × margin / 100
/// total    = (subtotal + ganancia) × quantity
/// ```
///
/// The result carries no product id or warnings; the engine fills those in.
pub fn compose(
    rows: &[LineOutcome],
    labor_fabrication: f64,
    labor_installation: f64,
    mesh: MeshBreakdown,
    margin_percent: f64,
    quantity: i64,
) -> Result<PricingResult, ValidationError> {
    let cantidad = validate_inputs(margin_percent, quantity)?;

    // Folded from +0.0: an empty f64 sum is -0.0
    let total_materiales = rows
        .iter()
        .map(LineOutcome::importe)
        .fold(0.0, |acc, importe| acc + importe);
    let total_impuestos = rows
        .iter()
        .map(|r| match r {
            LineOutcome::Priced(row) => row.tax_amount,
            LineOutcome::Failed(_) => 0.0,
        })
        .fold(0.0, |acc, tax| acc + tax);

    let subtotal = total_materiales + labor_fabrication + labor_installation + mesh.total;
    let ganancia_neta = subtotal * margin_percent / 100.0;
    let precio_unitario = subtotal + ganancia_neta;
    let total = precio_unitario * f64::from(cantidad);

    Ok(PricingResult {
        producto_id: String::new(),
        producto: String::new(),
        cantidad,
        margen_ganancia: margin_percent,
        estado: quote_status(rows),
        materiales: rows.iter().map(LineOutcome::to_row).collect(),
        malla: mesh,
        costos: Costs {
            total_materiales,
            mano_obra_fabricacion: labor_fabrication,
            mano_obra_instalacion: labor_installation,
            mano_obra_malla: mesh.labor_subtotal,
            materiales_malla: mesh.material_subtotal,
            total_malla: mesh.total,
            subtotal,
            ganancia_neta,
            precio_unitario,
            total,
            total_impuestos: total_impuestos * f64::from(cantidad),
        },
        avisos: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formula::FormulaError;
    use crate::entities::result::{FailedLine, MaterialCostRow};

    fn row(material_id: &str, importe: f64, estado: RowStatus) -> LineOutcome {
        LineOutcome::Priced(MaterialCostRow {
            material_id: material_id.to_string(),
            name: material_id.to_string(),
            unit: None,
            formula: "1".to_string(),
            raw_quantity: 1.0,
            coverage_factor: 1.0,
            yield_quantity: 1.0,
            provider_id: None,
            variant_id: None,
            unit_price: importe,
            discount_percent: 0.0,
            variant_surcharge: 0.0,
            effective_price: importe,
            tax_percent: 16.0,
            tax_amount: importe * 0.16,
            importe,
            malla: false,
            resolved: estado == RowStatus::Ok,
            estado,
            error: None,
        })
    }

    #[test]
    fn test_totals_with_margin_and_quantity() {
        let rows = vec![row("A", 600.0, RowStatus::Ok)];
        let result = compose(&rows, 250.0, 150.0, MeshBreakdown::default(), 20.0, 2).unwrap();

        assert!((result.costos.subtotal - 1000.0).abs() < 1e-10);
        assert!((result.costos.ganancia_neta - 200.0).abs() < 1e-10);
        assert!((result.costos.precio_unitario - 1200.0).abs() < 1e-10);
        assert!((result.costos.total - 2400.0).abs() < 1e-10);
        assert_eq!(result.cantidad, 2);
        assert_eq!(result.estado, QuoteStatus::Completa);
    }

    #[test]
    fn test_mesh_counted_on_top_of_materials() {
        let rows = vec![row("MALLA", 100.0, RowStatus::Ok)];
        let mesh = MeshBreakdown {
            material_subtotal: 100.0,
            labor_subtotal: 0.0,
            total: 100.0,
        };
        let result = compose(&rows, 0.0, 0.0, mesh, 0.0, 1).unwrap();

        assert!((result.costos.total_materiales - 100.0).abs() < 1e-10);
        assert!((result.costos.materiales_malla - 100.0).abs() < 1e-10);
        assert!((result.costos.subtotal - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_taxes_are_informational() {
        let rows = vec![row("A", 100.0, RowStatus::Ok)];
        let result = compose(&rows, 0.0, 0.0, MeshBreakdown::default(), 0.0, 3).unwrap();
        assert!((result.costos.total_impuestos - 48.0).abs() < 1e-10);
        assert!((result.costos.total - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_totals_serialize_as_zero() {
        let result = compose(&[], 0.0, 0.0, MeshBreakdown::default(), 0.0, 1).unwrap();
        assert!(result.costos.total_materiales.is_sign_positive());
        assert!(result.costos.total_impuestos.is_sign_positive());

        let json = serde_json::to_string(&result.costos).unwrap();
        assert!(json.contains(r#""totalMateriales":0.0"#));
        assert!(!json.contains("-0.0"));
    }

    #[test]
    fn test_invalid_inputs() {
        let rows = vec![row("A", 100.0, RowStatus::Ok)];
        assert_eq!(
            compose(&rows, 0.0, 0.0, MeshBreakdown::default(), 10.0, 0).unwrap_err(),
            ValidationError::InvalidQuantity(0)
        );
        assert_eq!(
            compose(&rows, 0.0, 0.0, MeshBreakdown::default(), -1.0, 1).unwrap_err(),
            ValidationError::InvalidMargin(-1.0)
        );
        assert!(validate_inputs(f64::NAN, 1).is_err());
        assert!(validate_inputs(0.0, i64::MAX).is_err());
    }

    #[test]
    fn test_status() {
        assert_eq!(
            quote_status(&[row("A", 1.0, RowStatus::Ok), row("B", 0.0, RowStatus::Unresolved)]),
            QuoteStatus::Incompleta
        );
        let failed = LineOutcome::Failed(FailedLine {
            material_id: "C".to_string(),
            name: "C".to_string(),
            unit: None,
            formula: "1/0".to_string(),
            coverage_factor: 1.0,
            contributes_to_mesh: false,
            provider_id: None,
            variant_id: None,
            error: FormulaError::DivisionByZero,
        });
        assert_eq!(
            quote_status(&[row("B", 0.0, RowStatus::Unresolved), failed]),
            QuoteStatus::Invalida
        );
        assert_eq!(quote_status(&[]), QuoteStatus::Completa);
    }

    #[test]
    fn test_compose_is_idempotent() {
        let rows = vec![row("A", 123.45, RowStatus::Ok), row("B", 0.0, RowStatus::Unresolved)];
        let a = compose(&rows, 10.0, 5.0, MeshBreakdown::default(), 17.5, 3).unwrap();
        let b = compose(&rows, 10.0, 5.0, MeshBreakdown::default(), 17.5, 3).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
