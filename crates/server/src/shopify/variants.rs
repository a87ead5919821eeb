//! Variant selection for donation products.
//!
//! Donation products are sold as a set of giving levels. A `$0.01` variant
//! is the "any amount" unit: the storefront multiplies its quantity to reach
//! an arbitrary donation.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::types::{Product, ProductVariant};

/// Price of the single-cent variant.
const UNIT_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

fn price_of(variant: &ProductVariant) -> Option<Decimal> {
    Decimal::from_str(variant.price.amount.trim()).ok()
}

/// The `$0.01` variant when it is present and for sale, otherwise the
/// cheapest available variant. `None` when nothing is available.
#[must_use]
pub fn smallest_variant(product: &Product) -> Option<&ProductVariant> {
    let available = || product.variants.iter().filter(|v| v.available_for_sale);

    if let Some(unit) = available().find(|v| price_of(v) == Some(UNIT_PRICE)) {
        return Some(unit);
    }

    available()
        .filter_map(|v| price_of(v).map(|price| (price, v)))
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, v)| v)
}

/// The first available variant, else the first variant.
#[must_use]
pub fn default_variant(product: &Product) -> Option<&ProductVariant> {
    product
        .variants
        .iter()
        .find(|v| v.available_for_sale)
        .or_else(|| product.variants.first())
}

/// Whether the product and at least one of its variants are for sale.
#[must_use]
pub fn is_product_available(product: &Product) -> bool {
    product.available_for_sale && product.variants.iter().any(|v| v.available_for_sale)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::{Money, PriceRange};

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn variant(id: &str, amount: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: id.to_string(),
            title: amount.to_string(),
            price: money(amount),
            compare_at_price: None,
            available_for_sale: available,
            quantity_available: None,
            selected_options: vec![],
            image: None,
            sku: None,
        }
    }

    fn product(variants: Vec<ProductVariant>) -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            title: "Ramp Build".to_string(),
            handle: "ramp-build".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            tags: vec![],
            vendor: String::new(),
            product_type: String::new(),
            price_range: PriceRange {
                min_variant_price: money("0.01"),
                max_variant_price: money("100.00"),
            },
            images: vec![],
            variants,
        }
    }

    #[test]
    fn test_smallest_variant_prefers_unit_variant() {
        let p = product(vec![
            variant("a", "25.00", true),
            variant("b", "0.01", true),
            variant("c", "0.005", true),
        ]);
        assert_eq!(smallest_variant(&p).unwrap().id, "b");
    }

    #[test]
    fn test_smallest_variant_unit_price_formats() {
        let p = product(vec![variant("a", "5.0", true), variant("b", "0.010", true)]);
        assert_eq!(smallest_variant(&p).unwrap().id, "b");
    }

    #[test]
    fn test_smallest_variant_falls_back_to_cheapest_available() {
        let p = product(vec![
            variant("unit", "0.01", false),
            variant("big", "100.0", true),
            variant("small", "10.0", true),
            variant("cheap-sold-out", "1.0", false),
        ]);
        assert_eq!(smallest_variant(&p).unwrap().id, "small");
    }

    #[test]
    fn test_smallest_variant_none() {
        assert!(smallest_variant(&product(vec![])).is_none());
        let p = product(vec![variant("a", "10.0", false)]);
        assert!(smallest_variant(&p).is_none());
    }

    #[test]
    fn test_default_variant() {
        let p = product(vec![variant("a", "10.0", false), variant("b", "20.0", true)]);
        assert_eq!(default_variant(&p).unwrap().id, "b");

        let p = product(vec![variant("a", "10.0", false), variant("b", "20.0", false)]);
        assert_eq!(default_variant(&p).unwrap().id, "a");

        assert!(default_variant(&product(vec![])).is_none());
    }

    #[test]
    fn test_is_product_available() {
        let p = product(vec![variant("a", "10.0", true)]);
        assert!(is_product_available(&p));

        let p = product(vec![variant("a", "10.0", false)]);
        assert!(!is_product_available(&p));

        let mut p = product(vec![variant("a", "10.0", true)]);
        p.available_for_sale = false;
        assert!(!is_product_available(&p));
    }
}
