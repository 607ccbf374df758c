//! Monetary amounts.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// All monetary values are exact decimals.
pub type Money = Decimal;

/// Number of fractional digits kept on computed amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a computed amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Lift a `checked_*` result, rejecting amounts `Decimal` cannot represent.
pub fn money_in_range(amount: Option<Decimal>) -> DomainResult<Money> {
    amount.ok_or_else(|| DomainError::invalid_request("amount out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(5.405)), dec!(5.41));
        assert_eq!(round_money(dec!(5.404)), dec!(5.40));
        assert_eq!(round_money(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn overflowing_amounts_are_invalid_requests() {
        assert_eq!(money_in_range(dec!(1.5).checked_add(dec!(2))).unwrap(), dec!(3.5));
        assert_eq!(
            money_in_range(Decimal::MAX.checked_mul(dec!(2))),
            Err(DomainError::invalid_request("amount out of range"))
        );
    }

    #[test]
    fn keeps_exact_amounts() {
        assert_eq!(round_money(dec!(5.40)), dec!(5.40));
        assert_eq!(round_money(dec!(30)), dec!(30));
    }
}
