//! Labor cost selection
//!
//! See [`crate::entities::labor`] for the tie-break rule between matching
//! rules.

use crate::entities::dimensions::Dimensions;
use crate::entities::labor::{LaborRule, LaborType};

/// Pick the rule that prices `labor_type` for this product
///
/// Only active rules of the requested type whose filters match are
/// considered. The highest specificity wins; ties keep the earliest rule.
pub fn select_rule<'a>(
    rules: &'a [LaborRule],
    labor_type: LaborType,
    product_type: Option<&str>,
    material_ids: &[&str],
) -> Option<&'a LaborRule> {
    let mut best: Option<&LaborRule> = None;

    for rule in rules {
        if !rule.active || rule.labor_type != labor_type {
            continue;
        }
        if !rule
            .applicability
            .matches(product_type, material_ids.iter().copied())
        {
            continue;
        }
        let better = match best {
            Some(current) => {
                rule.applicability.specificity() > current.applicability.specificity()
            }
            None => true,
        };
        if better {
            best = Some(rule);
        }
    }

    best
}

/// Labor cost of one type: `area × rate`, or 0 when no rule applies
pub fn compute_labor(
    rules: &[LaborRule],
    dims: &Dimensions,
    product_type: Option<&str>,
    labor_type: LaborType,
    material_ids: &[&str],
) -> f64 {
    match select_rule(rules, labor_type, product_type, material_ids) {
        Some(rule) => {
            tracing::debug!(
                labor = %labor_type,
                rule = rule.id.as_deref().unwrap_or("-"),
                rate = rule.rate_per_area,
                "labor rule selected"
            );
            dims.area() * rule.rate_per_area
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions::new(2.0, 1.5).unwrap()
    }

    #[test]
    fn test_no_rule_is_zero() {
        let cost = compute_labor(&[], &dims(), Some("fija"), LaborType::Fabrication, &[]);
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_area_times_rate() {
        let rules = vec![LaborRule::new(LaborType::Fabrication, 100.0)];
        let cost = compute_labor(&rules, &dims(), None, LaborType::Fabrication, &[]);
        assert!((cost - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_type_and_active_filter() {
        let rules = vec![
            LaborRule::new(LaborType::Installation, 50.0),
            LaborRule::new(LaborType::Fabrication, 80.0).inactive(),
        ];
        assert_eq!(
            compute_labor(&rules, &dims(), None, LaborType::Fabrication, &[]),
            0.0
        );
        assert!(
            (compute_labor(&rules, &dims(), None, LaborType::Installation, &[]) - 150.0).abs()
                < 1e-10
        );
    }

    #[test]
    fn test_specific_rule_beats_earlier_wildcard() {
        let rules = vec![
            LaborRule::new(LaborType::Fabrication, 100.0).with_id("general"),
            LaborRule::new(LaborType::Fabrication, 140.0)
                .with_id("corrediza")
                .for_product_types(&["corrediza"]),
        ];
        let rule = select_rule(&rules, LaborType::Fabrication, Some("corrediza"), &[]).unwrap();
        assert_eq!(rule.id.as_deref(), Some("corrediza"));

        let rule = select_rule(&rules, LaborType::Fabrication, Some("fija"), &[]).unwrap();
        assert_eq!(rule.id.as_deref(), Some("general"));
    }

    #[test]
    fn test_equal_specificity_keeps_configuration_order() {
        let rules = vec![
            LaborRule::new(LaborType::Fabrication, 140.0)
                .with_id("por-tipo")
                .for_product_types(&["corrediza"]),
            LaborRule::new(LaborType::Fabrication, 160.0)
                .with_id("por-material")
                .for_materials(&["VID-6"]),
        ];
        let rule =
            select_rule(&rules, LaborType::Fabrication, Some("corrediza"), &["VID-6"]).unwrap();
        assert_eq!(rule.id.as_deref(), Some("por-tipo"));

        let swapped: Vec<_> = rules.into_iter().rev().collect();
        let rule =
            select_rule(&swapped, LaborType::Fabrication, Some("corrediza"), &["VID-6"]).unwrap();
        assert_eq!(rule.id.as_deref(), Some("por-material"));
    }

    #[test]
    fn test_both_filters_beat_one() {
        let rules = vec![
            LaborRule::new(LaborType::Installation, 10.0).for_product_types(&["fija"]),
            LaborRule::new(LaborType::Installation, 20.0)
                .with_id("doble")
                .for_product_types(&["fija"])
                .for_materials(&["VID-6"]),
        ];
        let rule = select_rule(&rules, LaborType::Installation, Some("fija"), &["VID-6"]).unwrap();
        assert_eq!(rule.id.as_deref(), Some("doble"));
    }

    #[test]
    fn test_non_matching_filter_is_skipped() {
        let rules = vec![LaborRule::new(LaborType::Fabrication, 90.0).for_product_types(&["puerta"])];
        assert!(select_rule(&rules, LaborType::Fabrication, Some("ventana"), &[]).is_none());
        assert!(select_rule(&rules, LaborType::Fabrication, None, &[]).is_none());
    }
}
