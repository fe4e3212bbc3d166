//! Price arithmetic: tax-exclusive (HT), VAT (TVA) and tax-inclusive (TTC).

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::OrderLine;

/// French standard VAT rate, 20%.
pub const VAT_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// `1 + VAT_RATE`.
pub const TTC_FACTOR: Decimal = Decimal::from_parts(120, 0, 0, false, 2);

/// Smallest amount the processor will charge, in currency units.
pub const MIN_CHARGE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// [`MIN_CHARGE`] in minor units (cents).
pub const MIN_CHARGE_MINOR: i64 = 50;

/// Rounds to cents, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax-inclusive unit price for a tax-exclusive one.
pub fn ttc_price(price_ht: Decimal) -> Decimal {
    round2(price_ht * TTC_FACTOR)
}

/// Converts a currency amount into minor units, rounding to the nearest cent.
///
/// Returns `None` when the amount does not fit an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Order totals. Each figure is rounded to cents on its own and the TTC
/// total is the sum of the two rounded figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal_ht: Decimal,
    pub tax: Decimal,
    pub total_ttc: Decimal,
}

impl OrderTotals {
    pub fn compute<'a>(lines: impl IntoIterator<Item = &'a OrderLine>) -> Self {
        let raw_ht: Decimal = lines.into_iter().map(OrderLine::line_total_ht).sum();
        let subtotal_ht = round2(raw_ht);
        let tax = round2(raw_ht * VAT_RATE);
        Self {
            subtotal_ht,
            tax,
            total_ttc: subtotal_ht + tax,
        }
    }

    pub fn zero() -> Self {
        Self {
            subtotal_ht: Decimal::ZERO,
            tax: Decimal::ZERO,
            total_ttc: Decimal::ZERO,
        }
    }

    pub fn is_chargeable(&self) -> bool {
        self.total_ttc >= MIN_CHARGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: u32) -> OrderLine {
        let price = Decimal::new(price_cents, 2);
        OrderLine {
            name: "item".into(),
            unit_price_ht: price,
            unit_price_ttc: ttc_price(price),
            quantity,
        }
    }

    #[test]
    fn ttc_price_adds_twenty_percent() {
        assert_eq!(ttc_price(Decimal::new(1000, 2)), Decimal::new(1200, 2));
        assert_eq!(ttc_price(Decimal::new(99, 2)), Decimal::new(119, 2));
        assert_eq!(ttc_price(Decimal::new(2550, 2)), Decimal::new(3060, 2));
    }

    #[test]
    fn ttc_price_rounds_midpoint_away_from_zero() {
        // 0.0125 * 1.2 = 0.015
        assert_eq!(ttc_price(Decimal::new(125, 4)), Decimal::new(2, 2));
    }

    #[test]
    fn ttc_price_stays_within_half_a_cent_for_every_cent_amount() {
        let half_cent = Decimal::new(5, 3);
        for cents in 1..=20_000 {
            let ht = Decimal::new(cents, 2);
            let ttc = ttc_price(ht);
            assert_eq!(ttc, ttc.round_dp(2));
            assert!((ttc - ht * TTC_FACTOR).abs() <= half_cent, "ht={ht}");
        }
    }

    #[test]
    fn totals_for_two_products() {
        let lines = [line(1000, 2), line(2550, 1)];
        let totals = OrderTotals::compute(&lines);

        assert_eq!(totals.subtotal_ht, Decimal::new(4550, 2));
        assert_eq!(totals.tax, Decimal::new(910, 2));
        assert_eq!(totals.total_ttc, Decimal::new(5460, 2));
    }

    #[test]
    fn total_is_sum_of_rounded_terms() {
        // 3 x 0.35 = 1.05 HT, tax 0.21
        let lines = [line(35, 3), line(1, 0)];
        let totals = OrderTotals::compute(&lines);

        assert_eq!(totals.subtotal_ht, Decimal::new(105, 2));
        assert_eq!(totals.tax, Decimal::new(21, 2));
        assert_eq!(totals.total_ttc, totals.subtotal_ht + totals.tax);
    }

    #[test]
    fn minimum_charge_threshold() {
        assert!(!OrderTotals::compute(&[line(41, 1)]).is_chargeable());
        assert!(OrderTotals::compute(&[line(42, 1)]).is_chargeable());
        assert!(!OrderTotals::zero().is_chargeable());
    }

    #[test]
    fn minor_units_round_to_nearest_cent() {
        assert_eq!(to_minor_units(Decimal::new(5460, 2)), Some(5460));
        assert_eq!(to_minor_units(Decimal::new(4, 1)), Some(40));
        assert_eq!(to_minor_units(Decimal::new(4995, 4)), Some(50));
        assert_eq!(from_minor_units(5460), Decimal::new(5460, 2));
    }
}
