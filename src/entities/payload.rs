//! Quote payload - the caller's pricing request as it arrives over the wire

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::dimensions::Dimensions;

/// Provider and variant choices, keyed by material id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    /// material id -> provider id
    #[serde(default)]
    pub proveedores: BTreeMap<String, String>,

    /// material id -> variant id
    #[serde(default)]
    pub variantes: BTreeMap<String, String>,
}

/// Pricing request payload
///
/// ```json
/// {
///   "productoId": "VC-2H",
///   "dimensiones": { "ancho": 1.5, "alto": 1.2 },
///   "selecciones": { "proveedores": { "ALU-RIEL": "CUPRUM" }, "variantes": {} },
///   "margenGanancia": 30,
///   "cantidad": 2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub producto_id: String,

    pub dimensiones: Dimensions,

    /// Whether the opening gets a mesh (exposed to formulas as `malla`)
    #[serde(default)]
    pub malla: bool,

    #[serde(default)]
    pub selecciones: Selections,

    /// Percent; falls back to the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margen_ganancia: Option<f64>,

    #[serde(default = "default_quantity")]
    pub cantidad: i64,

    /// Extra formula variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, f64>,
}

fn default_quantity() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let json = r#"{
            "productoId": "VC-2H",
            "dimensiones": { "ancho": 1.5, "alto": 1.2 },
            "selecciones": {
                "proveedores": { "ALU-RIEL": "CUPRUM" },
                "variantes": { "ALU-RIEL": "blanco" }
            },
            "margenGanancia": 30,
            "cantidad": 2
        }"#;
        let payload: QuotePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.producto_id, "VC-2H");
        assert_eq!(payload.dimensiones.width, 1.5);
        assert_eq!(payload.selecciones.proveedores["ALU-RIEL"], "CUPRUM");
        assert_eq!(payload.selecciones.variantes["ALU-RIEL"], "blanco");
        assert_eq!(payload.margen_ganancia, Some(30.0));
        assert_eq!(payload.cantidad, 2);
        assert!(!payload.malla);
    }

    #[test]
    fn test_defaults() {
        let json = r#"{ "productoId": "F1", "dimensiones": { "ancho": 1, "alto": 1 } }"#;
        let payload: QuotePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.cantidad, 1);
        assert!(payload.margen_ganancia.is_none());
        assert!(payload.selecciones.proveedores.is_empty());
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let json = r#"{ "productoId": "F1", "dimensiones": { "ancho": 1, "alto": 1 }, "cantidad": 1.5 }"#;
        assert!(serde_json::from_str::<QuotePayload>(json).is_err());
    }
}
