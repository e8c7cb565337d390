//! Money math shared by the document services and the restore pipeline.
//!
//! All amounts are rounded half-up on the cent boundary. Totals are always
//! derived from line items; stored values are overwritten on every save.

use crate::models::DiscountType;

/// Round to two decimal places, half-up on the cent boundary.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Net total of a single line: quantity x unit price, line discount applied,
/// then line tax.
pub fn line_total(quantity: f64, unit_price: f64, discount: f64, tax_rate: f64) -> f64 {
    let net = quantity * unit_price * (1.0 - discount / 100.0);
    round_cents(net * (1.0 + tax_rate / 100.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// Document-level totals: subtotal is the sum of line totals, the discount
/// (percentage or fixed) applies to the subtotal, tax applies to the
/// post-discount amount.
pub fn document_totals(
    line_totals: &[f64],
    discount_type: DiscountType,
    discount_value: f64,
    tax_rate: f64,
) -> DocumentTotals {
    let subtotal = round_cents(line_totals.iter().sum());
    let discount_amount = match discount_type {
        DiscountType::Percentage => round_cents(subtotal * discount_value / 100.0),
        // A fixed discount can never exceed the subtotal
        DiscountType::Fixed => round_cents(discount_value.min(subtotal)),
    };
    let after_discount = subtotal - discount_amount;
    let tax_amount = round_cents(after_discount * tax_rate / 100.0);
    let total = round_cents(after_discount + tax_amount);

    DocumentTotals {
        subtotal,
        discount_amount,
        tax_amount,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_on_cent_boundary() {
        // 0.125 and 0.375 are exact in binary, so the half-cent case is real
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(2.344), 2.34);
        assert_eq!(round_cents(2.346), 2.35);
        assert_eq!(round_cents(0.0), 0.0);
    }

    #[test]
    fn percentage_discount_then_tax() {
        // subtotal 100.00, 10% discount, 8% tax -> 97.20
        let totals = document_totals(&[100.0], DiscountType::Percentage, 10.0, 8.0);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.discount_amount, 10.0);
        assert_eq!(totals.tax_amount, 7.2);
        assert_eq!(totals.total, 97.2);
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        let totals = document_totals(&[40.0], DiscountType::Fixed, 50.0, 0.0);
        assert_eq!(totals.discount_amount, 40.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn line_total_applies_discount_before_tax() {
        // 2 x 50.00, 10% line discount, 8% tax
        assert_eq!(line_total(2.0, 50.0, 10.0, 8.0), 97.2);
        assert_eq!(line_total(1.0, 19.99, 0.0, 0.0), 19.99);
    }
}
