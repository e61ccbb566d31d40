//! Stability fee accrual.

use crate::error::CdpError;
use crate::math::{Decimal, Rate, TryDiv, TryMul};
use crate::state::SECONDS_PER_YEAR;

/// Simple interest owed on `debt` at `annual_rate` over `elapsed_seconds`.
///
/// `debt * annual_rate * elapsed / SECONDS_PER_YEAR`, truncated. The result
/// does not compound within a single call; the debt operations fold accrued
/// fees into principal between calls, which is where compounding happens.
/// Elapsed time is unsigned by construction; callers turn a clock regression
/// into an error before it reaches this function.
pub fn accrue_stability_fee(
    debt: Decimal,
    annual_rate: Rate,
    elapsed_seconds: u64,
) -> Result<Decimal, CdpError> {
    if debt == Decimal::zero() || elapsed_seconds == 0 {
        return Ok(Decimal::zero());
    }
    debt.try_mul(annual_rate)?
        .try_mul(elapsed_seconds)?
        .try_div(SECONDS_PER_YEAR)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_fee_without_time_or_debt() {
        let rate = Rate::from_percent(5);
        assert_eq!(
            accrue_stability_fee(Decimal::from(2000u64), rate, 0).unwrap(),
            Decimal::zero()
        );
        assert_eq!(
            accrue_stability_fee(Decimal::zero(), rate, 86_400).unwrap(),
            Decimal::zero()
        );
        assert_eq!(
            accrue_stability_fee(Decimal::from(2000u64), Rate::zero(), 86_400).unwrap(),
            Decimal::zero()
        );
    }

    #[test]
    fn one_day_at_five_percent() {
        // 2000 * 5% * 86400 / 31536000 = 100 * 86400 / 31536000
        //                              = 0.273972602739726027...
        let fee =
            accrue_stability_fee(Decimal::from(2000u64), Rate::from_percent(5), 86_400).unwrap();
        assert_eq!(fee.to_scaled_val(), 273_972_602_739_726_027);
    }

    #[test]
    fn full_year_is_exact() {
        let fee = accrue_stability_fee(
            Decimal::from(2000u64),
            Rate::from_percent(5),
            SECONDS_PER_YEAR,
        )
        .unwrap();
        assert_eq!(fee, Decimal::from(100u64));
    }

    #[test]
    fn fee_rounds_down() {
        // One second of interest on 2000 at 5%: 100e18 / 31536000 truncated.
        let fee = accrue_stability_fee(Decimal::from(2000u64), Rate::from_percent(5), 1).unwrap();
        let expected = 100_000_000_000_000_000_000u128 / 31_536_000u128;
        assert_eq!(fee.to_scaled_val(), expected);
    }
}
