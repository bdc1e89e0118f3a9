//! Pricing result - the itemized breakdown returned to the caller
//!
//! Field names on the wire follow the quoting API (`materiales`, `costos`,
//! `importe`, ...).

use serde::{Deserialize, Serialize};

use crate::core::formula::FormulaError;

/// Effective unit price for one material line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceResolution {
    pub unit_price: f64,
    pub discount_percent: f64,
    pub variant_surcharge: f64,
    pub tax_percent: f64,
    /// `(unit_price + variant_surcharge) × (1 − discount/100)`
    pub effective_price: f64,
    /// False when no provider offer backs this price
    pub resolved: bool,
}

impl PriceResolution {
    pub fn unresolved() -> Self {
        Self {
            unit_price: 0.0,
            discount_percent: 0.0,
            variant_surcharge: 0.0,
            tax_percent: 0.0,
            effective_price: 0.0,
            resolved: false,
        }
    }
}

/// Row marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    #[serde(rename = "ok")]
    Ok,
    /// No provider offer; priced at 0
    #[serde(rename = "sin_proveedor")]
    Unresolved,
    /// Formula failed and a quantity of 0 was substituted
    #[serde(rename = "sustituida")]
    Substituted,
    /// Formula failed; the row has no cost
    #[serde(rename = "fallida")]
    Failed,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Ok => write!(f, "ok"),
            RowStatus::Unresolved => write!(f, "sin_proveedor"),
            RowStatus::Substituted => write!(f, "sustituida"),
            RowStatus::Failed => write!(f, "fallida"),
        }
    }
}

/// One priced material line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCostRow {
    #[serde(rename = "materialId")]
    pub material_id: String,

    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "unidad", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub formula: String,

    /// Raw formula result, after clamping negatives to 0
    #[serde(rename = "cantidad")]
    pub raw_quantity: f64,

    #[serde(rename = "factor")]
    pub coverage_factor: f64,

    /// Purchase units needed: `cantidad / factor`
    #[serde(rename = "rendimiento")]
    pub yield_quantity: f64,

    #[serde(rename = "proveedorId", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(rename = "varianteId", default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    #[serde(rename = "precioUnitario")]
    pub unit_price: f64,

    #[serde(rename = "descuento")]
    pub discount_percent: f64,

    #[serde(rename = "recargoVariante")]
    pub variant_surcharge: f64,

    #[serde(rename = "precioEfectivo")]
    pub effective_price: f64,

    #[serde(rename = "impuestoPorcentaje")]
    pub tax_percent: f64,

    /// Informational tax on `importe`
    #[serde(rename = "impuesto")]
    pub tax_amount: f64,

    /// Line cost: `rendimiento × precioEfectivo`
    pub importe: f64,

    /// Also counted under mesh
    pub malla: bool,

    #[serde(rename = "resuelto")]
    pub resolved: bool,

    pub estado: RowStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A line whose formula could not be evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLine {
    pub material_id: String,
    pub name: String,
    pub unit: Option<String>,
    pub formula: String,
    pub coverage_factor: f64,
    pub contributes_to_mesh: bool,
    pub provider_id: Option<String>,
    pub variant_id: Option<String>,
    pub error: FormulaError,
}

impl FailedLine {
    /// Row shown in the breakdown for a failed line: zero cost, explicit marker
    pub fn to_row(&self) -> MaterialCostRow {
        MaterialCostRow {
            material_id: self.material_id.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            formula: self.formula.clone(),
            raw_quantity: 0.0,
            coverage_factor: self.coverage_factor,
            yield_quantity: 0.0,
            provider_id: self.provider_id.clone(),
            variant_id: self.variant_id.clone(),
            unit_price: 0.0,
            discount_percent: 0.0,
            variant_surcharge: 0.0,
            effective_price: 0.0,
            tax_percent: 0.0,
            tax_amount: 0.0,
            importe: 0.0,
            malla: self.contributes_to_mesh,
            resolved: false,
            estado: RowStatus::Failed,
            error: Some(self.error.to_string()),
        }
    }
}

/// Result of pricing one material line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Priced(MaterialCostRow),
    Failed(FailedLine),
}

impl LineOutcome {
    pub fn material_id(&self) -> &str {
        match self {
            LineOutcome::Priced(row) => &row.material_id,
            LineOutcome::Failed(failed) => &failed.material_id,
        }
    }

    /// Whether the line itself is flagged as mesh material
    pub fn contributes_to_mesh(&self) -> bool {
        match self {
            LineOutcome::Priced(row) => row.malla,
            LineOutcome::Failed(failed) => failed.contributes_to_mesh,
        }
    }

    /// Flag the line as mesh material
    pub fn mark_mesh(&mut self) {
        match self {
            LineOutcome::Priced(row) => row.malla = true,
            LineOutcome::Failed(failed) => failed.contributes_to_mesh = true,
        }
    }

    /// Line cost; failed lines cost nothing
    pub fn importe(&self) -> f64 {
        match self {
            LineOutcome::Priced(row) => row.importe,
            LineOutcome::Failed(_) => 0.0,
        }
    }

    pub fn to_row(&self) -> MaterialCostRow {
        match self {
            LineOutcome::Priced(row) => row.clone(),
            LineOutcome::Failed(failed) => failed.to_row(),
        }
    }
}

/// Non-fatal issue surfaced with the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum PricingWarning {
    /// Price defaulted to 0
    SelectionUnresolved {
        #[serde(rename = "materialId")]
        material_id: String,
        #[serde(rename = "proveedorId", default, skip_serializing_if = "Option::is_none")]
        provider_id: Option<String>,
        #[serde(rename = "motivo")]
        reason: String,
    },
    /// Formula returned a negative quantity
    QuantityClamped {
        #[serde(rename = "materialId")]
        material_id: String,
        #[serde(rename = "valor")]
        value: f64,
    },
    /// Formula failed and 0 was used
    FormulaSubstituted {
        #[serde(rename = "materialId")]
        material_id: String,
        error: String,
    },
    /// Formula failed; quote is invalid
    FormulaFailed {
        #[serde(rename = "materialId")]
        material_id: String,
        error: String,
    },
    /// Variant not listed by the offer; no surcharge applied
    VariantUnknown {
        #[serde(rename = "materialId")]
        material_id: String,
        #[serde(rename = "varianteId")]
        variant_id: String,
    },
}

impl std::fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingWarning::SelectionUnresolved {
                material_id,
                reason,
                ..
            } => write!(f, "{}: no provider price ({}); priced at 0", material_id, reason),
            PricingWarning::QuantityClamped { material_id, value } => write!(
                f,
                "{}: formula returned negative quantity {}; clamped to 0",
                material_id, value
            ),
            PricingWarning::FormulaSubstituted { material_id, error } => {
                write!(f, "{}: formula failed ({}); quantity 0 used", material_id, error)
            }
            PricingWarning::FormulaFailed { material_id, error } => {
                write!(f, "{}: formula failed ({})", material_id, error)
            }
            PricingWarning::VariantUnknown {
                material_id,
                variant_id,
            } => write!(
                f,
                "{}: variant '{}' is not offered; no surcharge applied",
                material_id, variant_id
            ),
        }
    }
}

/// Mesh cost reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBreakdown {
    #[serde(rename = "materiales")]
    pub material_subtotal: f64,

    #[serde(rename = "manoObra")]
    pub labor_subtotal: f64,

    pub total: f64,
}

/// Cost summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Costs {
    pub total_materiales: f64,
    pub mano_obra_fabricacion: f64,
    pub mano_obra_instalacion: f64,
    pub mano_obra_malla: f64,
    pub materiales_malla: f64,
    pub total_malla: f64,
    pub subtotal: f64,
    pub ganancia_neta: f64,
    /// Price of one unit: `subtotal + gananciaNeta`
    pub precio_unitario: f64,
    pub total: f64,
    /// Informational; not part of `total`
    pub total_impuestos: f64,
}

/// Overall state of a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Every line priced from a provider offer
    Completa,
    /// Some lines are unresolved or substituted; totals are understated
    Incompleta,
    /// Some lines failed; totals cannot be trusted
    Invalida,
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteStatus::Completa => write!(f, "completa"),
            QuoteStatus::Incompleta => write!(f, "incompleta"),
            QuoteStatus::Invalida => write!(f, "invalida"),
        }
    }
}

/// Full itemized breakdown for one quote line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub producto_id: String,

    #[serde(default)]
    pub producto: String,

    pub cantidad: u32,

    pub margen_ganancia: f64,

    pub estado: QuoteStatus,

    pub materiales: Vec<MaterialCostRow>,

    pub malla: MeshBreakdown,

    pub costos: Costs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub avisos: Vec<PricingWarning>,
}

impl PricingResult {
    pub fn is_complete(&self) -> bool {
        self.estado == QuoteStatus::Completa
    }

    pub fn is_valid(&self) -> bool {
        self.estado != QuoteStatus::Invalida
    }

    pub fn rows_with_status(&self, status: RowStatus) -> impl Iterator<Item = &MaterialCostRow> {
        self.materiales.iter().filter(move |r| r.estado == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_line_row_is_marked() {
        let failed = FailedLine {
            material_id: "VID-4".to_string(),
            name: "Vidrio 4mm".to_string(),
            unit: Some("m2".to_string()),
            formula: "area / x".to_string(),
            coverage_factor: 1.0,
            contributes_to_mesh: false,
            provider_id: Some("VITRO".to_string()),
            variant_id: Some("claro".to_string()),
            error: FormulaError::UnknownVariable("x".to_string()),
        };
        let row = LineOutcome::Failed(failed).to_row();
        assert_eq!(row.estado, RowStatus::Failed);
        assert_eq!(row.importe, 0.0);
        assert!(!row.resolved);
        assert_eq!(row.unit.as_deref(), Some("m2"));
        assert_eq!(row.provider_id.as_deref(), Some("VITRO"));
        assert_eq!(row.variant_id.as_deref(), Some("claro"));
        assert!(row.error.unwrap().contains("'x'"));
    }

    #[test]
    fn test_mark_mesh() {
        let mut outcome = LineOutcome::Failed(FailedLine {
            material_id: "MALLA".to_string(),
            name: "Malla".to_string(),
            unit: None,
            formula: "x".to_string(),
            coverage_factor: 1.0,
            contributes_to_mesh: false,
            provider_id: None,
            variant_id: None,
            error: FormulaError::UnknownVariable("x".to_string()),
        });
        assert!(!outcome.contributes_to_mesh());
        outcome.mark_mesh();
        assert!(outcome.contributes_to_mesh());
        assert!(outcome.to_row().malla);
    }

    #[test]
    fn test_warning_serialization() {
        let warning = PricingWarning::SelectionUnresolved {
            material_id: "ALU-1".to_string(),
            provider_id: Some("P9".to_string()),
            reason: "provider not offered".to_string(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains(r#""tipo":"selection_unresolved""#));
        assert!(json.contains(r#""materialId":"ALU-1""#));
        assert!(warning.to_string().contains("priced at 0"));
    }

    #[test]
    fn test_costs_wire_names() {
        let json = serde_json::to_value(Costs::default()).unwrap();
        for key in [
            "totalMateriales",
            "manoObraFabricacion",
            "manoObraInstalacion",
            "manoObraMalla",
            "subtotal",
            "gananciaNeta",
            "total",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }
}
