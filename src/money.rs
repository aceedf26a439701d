//! Conversions between integer minor units and boundary decimals.
//!
//! All internal arithmetic is done on `i64` minor units; `Decimal` appears
//! only at external boundaries (gateway requests, HTTP responses).

use crate::errors::ServiceError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Scale used when rendering amounts at external boundaries.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Render a minor-unit amount as a decimal (13_900 -> 139.00).
pub fn minor_to_decimal(amount_minor: i64) -> Decimal {
    Decimal::new(amount_minor, MINOR_UNIT_SCALE)
}

/// Convert a boundary decimal into minor units, rounding half-away-from-zero
/// at two decimal places (139.005 -> 13_901).
pub fn decimal_to_minor(amount: Decimal) -> Result<i64, ServiceError> {
    let rounded = amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::from(100))
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError(format!("amount out of range: {}", amount)))
}
