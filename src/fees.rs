//! Transfer fee and total calculation

use rust_decimal::Decimal;

/// Flat transfer fee rate, 1.5%
pub fn default_fee_rate() -> Decimal {
    Decimal::new(15, 3)
}

/// `floor(principal * rate)`.
///
/// Whole-unit flooring is part of the contract: a 999 transfer costs 14, not
/// 14.985. Flooring goes toward negative infinity, so a negative principal gets
/// a fee that rounds away from zero. `None` when the product or the total
/// leaves the representable range.
pub fn compute_fee(principal: Decimal, rate: Decimal) -> Option<Decimal> {
    principal.checked_mul(rate).map(|fee| fee.floor())
}

pub fn compute_total(principal: Decimal, rate: Decimal) -> Option<Decimal> {
    principal.checked_add(compute_fee(principal, rate)?)
}

/// Fee and total for one principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub principal: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
}

impl FeeQuote {
    pub fn new(principal: Decimal, rate: Decimal) -> Option<Self> {
        let fee = compute_fee(principal, rate)?;
        Some(Self {
            principal,
            fee,
            total: principal.checked_add(fee)?,
        })
    }
}
