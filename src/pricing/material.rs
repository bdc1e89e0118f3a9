//! Material line costing
//!
//! Each line is priced independently: its formula gives a quantity in
//! natural units, the coverage factor turns that into purchase units, and
//! the resolved price gives the line cost. A formula failure on one line is
//! recorded on that line and never stops the others.

use std::collections::HashMap;

use crate::core::error::ConfigurationError;
use crate::core::formula::{Environment, Formula, FormulaError};
use crate::entities::material::{MaterialLine, Selection};
use crate::entities::request::{FormulaErrorPolicy, QuoteLine};
use crate::entities::result::{FailedLine, LineOutcome, MaterialCostRow, PricingWarning, RowStatus};
use crate::pricing::price::resolve_price;

/// Prices material lines against one environment
///
/// Parsed formulas are memoized for the lifetime of the calculator, which
/// is a single request.
pub struct MaterialCalculator<'a> {
    env: &'a Environment,
    policy: FormulaErrorPolicy,
    formulas: HashMap<String, Result<Formula, FormulaError>>,
    warnings: Vec<PricingWarning>,
}

impl<'a> MaterialCalculator<'a> {
    pub fn new(env: &'a Environment, policy: FormulaErrorPolicy) -> Self {
        Self {
            env,
            policy,
            formulas: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn quantity(&mut self, source: &str) -> Result<f64, FormulaError> {
        let formula = self
            .formulas
            .entry(source.to_string())
            .or_insert_with(|| Formula::parse(source));
        match formula {
            Ok(f) => f.evaluate(self.env),
            Err(e) => Err(e.clone()),
        }
    }

    /// Price one line
    ///
    /// Returns `Err` only for a coverage factor <= 0, which aborts the request.
    pub fn compute_line(
        &mut self,
        line: &MaterialLine,
        selection: &Selection,
    ) -> Result<LineOutcome, ConfigurationError> {
        line.validate()?;

        let mut status = RowStatus::Ok;
        let mut error = None;

        let mut raw_quantity = match self.quantity(&line.formula) {
            Ok(q) => q,
            Err(e) => match self.policy {
                FormulaErrorPolicy::Reject => {
                    tracing::debug!(material = %line.material_id, error = %e, "formula failed");
                    self.warnings.push(PricingWarning::FormulaFailed {
                        material_id: line.material_id.clone(),
                        error: e.to_string(),
                    });
                    return Ok(LineOutcome::Failed(FailedLine {
                        material_id: line.material_id.clone(),
                        name: line.name.clone(),
                        unit: line.unit.clone(),
                        formula: line.formula.clone(),
                        coverage_factor: line.coverage_factor,
                        contributes_to_mesh: line.contributes_to_mesh,
                        provider_id: selection.provider_id.clone(),
                        variant_id: selection.variant_id.clone(),
                        error: e,
                    }));
                }
                FormulaErrorPolicy::Zero => {
                    tracing::debug!(material = %line.material_id, error = %e, "formula failed, using 0");
                    self.warnings.push(PricingWarning::FormulaSubstituted {
                        material_id: line.material_id.clone(),
                        error: e.to_string(),
                    });
                    status = RowStatus::Substituted;
                    error = Some(e.to_string());
                    0.0
                }
            },
        };

        if raw_quantity < 0.0 {
            tracing::debug!(material = %line.material_id, quantity = raw_quantity, "negative quantity clamped");
            self.warnings.push(PricingWarning::QuantityClamped {
                material_id: line.material_id.clone(),
                value: raw_quantity,
            });
            raw_quantity = 0.0;
        }

        let yield_quantity = raw_quantity / line.coverage_factor;
        let price = resolve_price(selection.offer.as_ref(), selection.variant_id.as_deref());
        let importe = yield_quantity * price.effective_price;

        if let (Some(offer), Some(variant_id)) = (&selection.offer, &selection.variant_id) {
            if offer.variant(variant_id).is_none() {
                self.warnings.push(PricingWarning::VariantUnknown {
                    material_id: line.material_id.clone(),
                    variant_id: variant_id.clone(),
                });
            }
        }

        if !price.resolved {
            let reason = match selection.provider_id {
                Some(ref provider) => format!("provider '{}' does not offer this material", provider),
                None => "no provider selected".to_string(),
            };
            tracing::debug!(material = %line.material_id, %reason, "unresolved selection");
            self.warnings.push(PricingWarning::SelectionUnresolved {
                material_id: line.material_id.clone(),
                provider_id: selection.provider_id.clone(),
                reason,
            });
            if status == RowStatus::Ok {
                status = RowStatus::Unresolved;
            }
        }

        tracing::debug!(
            material = %line.material_id,
            quantity = raw_quantity,
            yield_quantity,
            price = price.effective_price,
            importe,
            "line priced"
        );

        Ok(LineOutcome::Priced(MaterialCostRow {
            material_id: line.material_id.clone(),
            name: line.name.clone(),
            unit: line.unit.clone(),
            formula: line.formula.clone(),
            raw_quantity,
            coverage_factor: line.coverage_factor,
            yield_quantity,
            provider_id: selection.provider_id.clone(),
            variant_id: selection.variant_id.clone(),
            unit_price: price.unit_price,
            discount_percent: price.discount_percent,
            variant_surcharge: price.variant_surcharge,
            effective_price: price.effective_price,
            tax_percent: price.tax_percent,
            tax_amount: importe * price.tax_percent / 100.0,
            importe,
            malla: line.contributes_to_mesh,
            resolved: price.resolved,
            estado: status,
            error,
        }))
    }

    /// Price every line, in order
    pub fn compute_all(&mut self, lines: &[QuoteLine]) -> Result<Vec<LineOutcome>, ConfigurationError> {
        lines
            .iter()
            .map(|ql| self.compute_line(&ql.line, &ql.selection))
            .collect()
    }

    pub fn warnings(&self) -> &[PricingWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<PricingWarning> {
        self.warnings
    }
}

/// Price a single line with the default (reject) formula policy
pub fn compute_material_line(
    line: &MaterialLine,
    selection: &Selection,
    env: &Environment,
) -> Result<LineOutcome, ConfigurationError> {
    MaterialCalculator::new(env, FormulaErrorPolicy::Reject).compute_line(line, selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::ProviderOffer;

    fn env() -> Environment {
        let mut env = Environment::new();
        env.insert("ancho".to_string(), 3.0);
        env.insert("alto".to_string(), 3.0);
        env
    }

    fn priced(outcome: LineOutcome) -> MaterialCostRow {
        match outcome {
            LineOutcome::Priced(row) => row,
            LineOutcome::Failed(f) => panic!("line failed: {}", f.error),
        }
    }

    #[test]
    fn test_yield_and_importe() {
        // 12 m of profile, 6 m bars, 50 per bar
        let line = MaterialLine::new("ALU-1", "ancho*2 + alto*2", 6.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 50.0));
        let row = priced(compute_material_line(&line, &selection, &env()).unwrap());

        assert!((row.raw_quantity - 12.0).abs() < 1e-10);
        assert!((row.yield_quantity - 2.0).abs() < 1e-10);
        assert!((row.importe - 100.0).abs() < 1e-10);
        assert_eq!(row.estado, RowStatus::Ok);
        assert!(row.resolved);
    }

    #[test]
    fn test_tax_amount_on_row() {
        let line = MaterialLine::new("VID", "1", 1.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 200.0).with_tax(16.0));
        let row = priced(compute_material_line(&line, &selection, &env()).unwrap());
        assert!((row.tax_amount - 32.0).abs() < 1e-10);
        assert!((row.importe - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_coverage_factor_is_fatal() {
        let line = MaterialLine::new("ALU-1", "ancho", 0.0);
        let result = compute_material_line(&line, &Selection::default(), &env());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidCoverageFactor { .. })
        ));
    }

    #[test]
    fn test_negative_quantity_clamped() {
        let e = env();
        let mut calc = MaterialCalculator::new(&e, FormulaErrorPolicy::Reject);
        let line = MaterialLine::new("ALU-1", "ancho - 10", 1.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 50.0));
        let row = priced(calc.compute_line(&line, &selection).unwrap());

        assert_eq!(row.raw_quantity, 0.0);
        assert_eq!(row.importe, 0.0);
        assert!(matches!(
            calc.warnings()[0],
            PricingWarning::QuantityClamped { value, .. } if (value + 7.0).abs() < 1e-10
        ));
    }

    #[test]
    fn test_unresolved_selection_prices_zero() {
        let e = env();
        let mut calc = MaterialCalculator::new(&e, FormulaErrorPolicy::Reject);
        let line = MaterialLine::new("ALU-1", "ancho", 1.0);
        let row = priced(
            calc.compute_line(&line, &Selection::unresolved(Some("GHOST".to_string())))
                .unwrap(),
        );

        assert_eq!(row.importe, 0.0);
        assert!(!row.resolved);
        assert_eq!(row.estado, RowStatus::Unresolved);
        assert_eq!(row.provider_id.as_deref(), Some("GHOST"));
        assert_eq!(calc.warnings().len(), 1);
    }

    #[test]
    fn test_unknown_variant_warns() {
        let e = env();
        let mut calc = MaterialCalculator::new(&e, FormulaErrorPolicy::Reject);
        let line = MaterialLine::new("ALU-1", "ancho", 1.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 50.0)).with_variant("dorado");
        let row = priced(calc.compute_line(&line, &selection).unwrap());

        assert_eq!(row.estado, RowStatus::Ok);
        assert!((row.importe - 150.0).abs() < 1e-10);
        assert!(matches!(
            &calc.warnings()[0],
            PricingWarning::VariantUnknown { variant_id, .. } if variant_id == "dorado"
        ));
    }

    #[test]
    fn test_formula_failure_reject_policy() {
        let line = MaterialLine::new("ALU-1", "ancho * x", 1.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 50.0));
        let outcome = compute_material_line(&line, &selection, &env()).unwrap();
        match outcome {
            LineOutcome::Failed(f) => {
                assert_eq!(f.error, FormulaError::UnknownVariable("x".to_string()))
            }
            LineOutcome::Priced(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_formula_failure_zero_policy() {
        let e = env();
        let mut calc = MaterialCalculator::new(&e, FormulaErrorPolicy::Zero);
        let line = MaterialLine::new("ALU-1", "ancho / 0", 1.0);
        let selection = Selection::resolved(ProviderOffer::new("P1", 50.0));
        let row = priced(calc.compute_line(&line, &selection).unwrap());

        assert_eq!(row.estado, RowStatus::Substituted);
        assert_eq!(row.importe, 0.0);
        assert!(row.error.is_some());
        assert!(matches!(
            calc.warnings()[0],
            PricingWarning::FormulaSubstituted { .. }
        ));
    }

    #[test]
    fn test_one_failure_does_not_stop_other_lines() {
        let e = env();
        let mut calc = MaterialCalculator::new(&e, FormulaErrorPolicy::Reject);
        let offer = ProviderOffer::new("P1", 10.0);
        let lines = vec![
            QuoteLine {
                line: MaterialLine::new("A", "ancho +", 1.0),
                selection: Selection::resolved(offer.clone()),
            },
            QuoteLine {
                line: MaterialLine::new("B", "ancho", 1.0),
                selection: Selection::resolved(offer),
            },
        ];
        let outcomes = calc.compute_all(&lines).unwrap();

        assert!(matches!(outcomes[0], LineOutcome::Failed(_)));
        assert!((outcomes[1].importe() - 30.0).abs() < 1e-10);
    }
}
