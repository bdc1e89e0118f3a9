//! Effective unit price resolution

use crate::entities::material::ProviderOffer;
use crate::entities::result::PriceResolution;

/// Resolve the effective unit price of an offer
///
/// `effective = (unit_price + variant_surcharge) × (1 − discount/100)`.
/// A variant id the offer does not list carries no surcharge. Without an
/// offer the price is 0 and `resolved` is false.
pub fn resolve_price(offer: Option<&ProviderOffer>, variant_id: Option<&str>) -> PriceResolution {
    let Some(offer) = offer else {
        return PriceResolution::unresolved();
    };

    let variant_surcharge = variant_id
        .and_then(|id| offer.variant(id))
        .map_or(0.0, |v| v.amount(offer.unit_price));

    let effective_price =
        (offer.unit_price + variant_surcharge) * (1.0 - offer.discount_percent / 100.0);

    PriceResolution {
        unit_price: offer.unit_price,
        discount_percent: offer.discount_percent,
        variant_surcharge,
        tax_percent: offer.tax_percent,
        effective_price,
        resolved: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::VariantSurcharge;

    fn offer() -> ProviderOffer {
        ProviderOffer::new("CUPRUM", 100.0)
            .with_discount(10.0)
            .with_tax(16.0)
            .with_variant(VariantSurcharge {
                variant_id: "blanco".to_string(),
                name: None,
                additional_price: Some(20.0),
                additional_percent: None,
            })
            .with_variant(VariantSurcharge {
                variant_id: "madera".to_string(),
                name: None,
                additional_price: None,
                additional_percent: Some(50.0),
            })
    }

    #[test]
    fn test_discount_without_variant() {
        let price = resolve_price(Some(&offer()), None);
        assert!((price.effective_price - 90.0).abs() < 1e-10);
        assert_eq!(price.variant_surcharge, 0.0);
        assert!(price.resolved);
    }

    #[test]
    fn test_variant_surcharge_before_discount() {
        let price = resolve_price(Some(&offer()), Some("blanco"));
        assert!((price.effective_price - 108.0).abs() < 1e-10);
        assert_eq!(price.variant_surcharge, 20.0);
    }

    #[test]
    fn test_percent_variant() {
        let price = resolve_price(Some(&offer()), Some("madera"));
        assert!((price.effective_price - 135.0).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_variant_has_no_surcharge() {
        let price = resolve_price(Some(&offer()), Some("dorado"));
        assert!((price.effective_price - 90.0).abs() < 1e-10);
        assert!(price.resolved);
    }

    #[test]
    fn test_tax_is_reported_not_applied() {
        let price = resolve_price(Some(&offer()), None);
        assert_eq!(price.tax_percent, 16.0);
        assert!((price.effective_price - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_missing_offer() {
        let price = resolve_price(None, Some("blanco"));
        assert_eq!(price.effective_price, 0.0);
        assert!(!price.resolved);
    }
}
