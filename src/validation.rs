//! Request and settlement checks for debt operations.
//!
//! Every business-rule rejection in the engine originates here; the debt
//! operations call these checks and otherwise only do arithmetic. The
//! checks come in stages: request checks run on the raw request before any
//! fee accrual, projection checks run on the post-accrual picture of a
//! mint, and settlement checks bound a burn's allocation.

use crate::error::CdpError;
use crate::math::Decimal;
use crate::processor::{BurnContext, BurnParams, MintContext, MintParams};
use crate::state::{Cdp, CdpState, CollateralConfig};

/// Checks shared by mints and burns, applied before fee accrual.
fn check_request(
    cdp: &Cdp,
    initiator: &odra::Address,
    amount: Decimal,
    timestamp: u64,
    max_operation_amount: Decimal,
    emergency_shutdown: bool,
    current_timestamp: u64,
) -> Result<(), CdpError> {
    if emergency_shutdown {
        return Err(CdpError::EmergencyShutdownActive);
    }
    match cdp.state {
        CdpState::Closed => return Err(CdpError::CdpClosed),
        CdpState::Frozen => return Err(CdpError::CdpFrozen),
        CdpState::Active { .. } | CdpState::Liquidatable => {}
    }
    if *initiator != cdp.owner {
        return Err(CdpError::Unauthorized);
    }
    if amount == Decimal::zero() {
        return Err(CdpError::InvalidAmount);
    }
    // The per-operation cap binds the requested amount, before any fee is
    // folded in.
    if amount > max_operation_amount {
        return Err(CdpError::InvalidAmount);
    }
    // Timestamps never regress. A request stamped before the position's
    // last update, or a context clock behind the request, means the caller
    // assembled an inconsistent snapshot; elapsed time would be negative.
    if timestamp < cdp.updated_at || current_timestamp < timestamp {
        return Err(CdpError::MathUnderflow);
    }
    Ok(())
}

/// Validate a mint request against the position and context snapshot.
pub fn validate_mint(cdp: &Cdp, params: &MintParams, ctx: &MintContext) -> Result<(), CdpError> {
    check_request(
        cdp,
        &params.initiator,
        params.amount,
        params.timestamp,
        ctx.max_operation_amount,
        ctx.emergency_shutdown,
        ctx.current_timestamp,
    )
}

/// Validate a burn request against the position and context snapshot.
pub fn validate_burn(cdp: &Cdp, params: &BurnParams, ctx: &BurnContext) -> Result<(), CdpError> {
    check_request(
        cdp,
        &params.initiator,
        params.amount,
        params.timestamp,
        ctx.max_operation_amount,
        ctx.emergency_shutdown,
        ctx.current_timestamp,
    )
}

/// Ceiling, floor and health checks against the projected post-mint
/// position. `projected_debt` already includes folded fees and the minted
/// amount; `projected_total_debt` is the system total under the same
/// projection.
pub fn check_mint_projection(
    projected_debt: Decimal,
    projected_total_debt: Decimal,
    projected_health: Decimal,
    config: &CollateralConfig,
    global_debt_ceiling: Decimal,
) -> Result<(), CdpError> {
    if projected_debt > config.debt_ceiling || projected_total_debt > global_debt_ceiling {
        return Err(CdpError::DebtCeilingExceeded);
    }
    if projected_debt < config.debt_floor {
        return Err(CdpError::BelowDebtFloor);
    }
    if projected_health < Decimal::one() {
        return Err(CdpError::InsufficientHealthFactor);
    }
    Ok(())
}

/// A burn may pay off at most the total owed (fees plus principal).
pub fn check_repayment_bound(burn_amount: Decimal, total_owed: Decimal) -> Result<(), CdpError> {
    if burn_amount > total_owed {
        return Err(CdpError::OverRepayment);
    }
    Ok(())
}

/// Repaying toward zero is always safe, but a burn must not strand a
/// nonzero principal under the debt floor.
pub fn check_remaining_debt(
    remaining_debt: Decimal,
    config: &CollateralConfig,
) -> Result<(), CdpError> {
    if remaining_debt > Decimal::zero() && remaining_debt < config.debt_floor {
        return Err(CdpError::BelowDebtFloor);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Rate;
    use crate::processor::{BurnContext, MintContext};
    use odra::Address;

    fn owner() -> Address {
        Address::Account(odra::casper_types::account::AccountHash::new([1u8; 32]))
    }

    fn stranger() -> Address {
        Address::Account(odra::casper_types::account::AccountHash::new([2u8; 32]))
    }

    fn config() -> CollateralConfig {
        CollateralConfig {
            liquidation_ratio_pct: 130,
            min_collateral_ratio_pct: 150,
            debt_ceiling: Decimal::from(1_000_000u64),
            debt_floor: Decimal::from(100u64),
        }
    }

    fn cdp() -> Cdp {
        let mut cdp = Cdp::open(owner(), Decimal::from(2u64), config(), 1_000);
        cdp.debt_amount = Decimal::from(2000u64);
        cdp
    }

    fn mint_ctx() -> MintContext {
        MintContext {
            collateral_price: Decimal::from(2000u64),
            global_debt_ceiling: Decimal::from(10_000_000u64),
            total_system_debt: Decimal::from(50_000u64),
            stability_fee_rate: Rate::from_percent(5),
            elapsed_seconds: 0,
            max_operation_amount: Decimal::from(100_000u64),
            emergency_shutdown: false,
            current_timestamp: 2_000,
        }
    }

    fn mint_params(amount: Decimal) -> MintParams {
        MintParams {
            initiator: owner(),
            amount,
            timestamp: 2_000,
        }
    }

    #[test]
    fn accepts_valid_mint_request() {
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::from(500u64)), &mint_ctx()),
            Ok(())
        );
    }

    #[test]
    fn rejects_during_shutdown() {
        let mut ctx = mint_ctx();
        ctx.emergency_shutdown = true;
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::from(500u64)), &ctx),
            Err(CdpError::EmergencyShutdownActive)
        );
    }

    #[test]
    fn rejects_terminal_states() {
        let mut closed = cdp();
        closed.state = CdpState::Closed;
        assert_eq!(
            validate_mint(&closed, &mint_params(Decimal::from(500u64)), &mint_ctx()),
            Err(CdpError::CdpClosed)
        );

        let mut frozen = cdp();
        frozen.state = CdpState::Frozen;
        assert_eq!(
            validate_mint(&frozen, &mint_params(Decimal::from(500u64)), &mint_ctx()),
            Err(CdpError::CdpFrozen)
        );
    }

    #[test]
    fn rejects_foreign_initiator() {
        let mut params = mint_params(Decimal::from(500u64));
        params.initiator = stranger();
        assert_eq!(
            validate_mint(&cdp(), &params, &mint_ctx()),
            Err(CdpError::Unauthorized)
        );
    }

    #[test]
    fn rejects_zero_amount() {
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::zero()), &mint_ctx()),
            Err(CdpError::InvalidAmount)
        );
    }

    #[test]
    fn rejects_amount_above_operation_cap() {
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::from(100_001u64)), &mint_ctx()),
            Err(CdpError::InvalidAmount)
        );
    }

    #[test]
    fn accepts_amount_at_operation_cap() {
        // The cap binds the request, not the request plus fees.
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::from(100_000u64)), &mint_ctx()),
            Ok(())
        );
    }

    #[test]
    fn rejects_regressing_timestamps() {
        let mut params = mint_params(Decimal::from(500u64));
        params.timestamp = 500; // before the position's last update
        assert_eq!(
            validate_mint(&cdp(), &params, &mint_ctx()),
            Err(CdpError::MathUnderflow)
        );

        let mut ctx = mint_ctx();
        ctx.current_timestamp = 1_500; // behind the request stamp
        assert_eq!(
            validate_mint(&cdp(), &mint_params(Decimal::from(500u64)), &ctx),
            Err(CdpError::MathUnderflow)
        );
    }

    #[test]
    fn burn_request_uses_same_gate() {
        let ctx = BurnContext {
            collateral_price: Decimal::from(2000u64),
            global_debt_ceiling: Decimal::from(10_000_000u64),
            total_system_debt: Decimal::from(50_000u64),
            stability_fee_rate: Rate::from_percent(5),
            elapsed_seconds: 0,
            max_operation_amount: Decimal::from(100_000u64),
            emergency_shutdown: false,
            current_timestamp: 2_000,
            auto_close: true,
        };
        let params = BurnParams {
            initiator: stranger(),
            amount: Decimal::from(500u64),
            timestamp: 2_000,
        };
        assert_eq!(
            validate_burn(&cdp(), &params, &ctx),
            Err(CdpError::Unauthorized)
        );
    }

    #[test]
    fn projection_enforces_ceilings() {
        // Position ceiling.
        assert_eq!(
            check_mint_projection(
                Decimal::from(1_000_001u64),
                Decimal::from(1_100_000u64),
                Decimal::from(2u64),
                &config(),
                Decimal::from(10_000_000u64),
            ),
            Err(CdpError::DebtCeilingExceeded)
        );
        // Global ceiling.
        assert_eq!(
            check_mint_projection(
                Decimal::from(500u64),
                Decimal::from(10_000_001u64),
                Decimal::from(2u64),
                &config(),
                Decimal::from(10_000_000u64),
            ),
            Err(CdpError::DebtCeilingExceeded)
        );
    }

    #[test]
    fn projection_enforces_debt_floor() {
        assert_eq!(
            check_mint_projection(
                Decimal::from(99u64),
                Decimal::from(99u64),
                Decimal::from(2u64),
                &config(),
                Decimal::from(10_000_000u64),
            ),
            Err(CdpError::BelowDebtFloor)
        );
    }

    #[test]
    fn projection_enforces_health_boundary() {
        let under_one = Decimal::from_scaled_val(999_999_999_999_999_999);
        assert_eq!(
            check_mint_projection(
                Decimal::from(500u64),
                Decimal::from(500u64),
                under_one,
                &config(),
                Decimal::from(10_000_000u64),
            ),
            Err(CdpError::InsufficientHealthFactor)
        );
        // Exactly 1.0 is safe.
        assert_eq!(
            check_mint_projection(
                Decimal::from(500u64),
                Decimal::from(500u64),
                Decimal::one(),
                &config(),
                Decimal::from(10_000_000u64),
            ),
            Ok(())
        );
    }

    #[test]
    fn settlement_bounds_repayment() {
        assert_eq!(
            check_repayment_bound(Decimal::from(101u64), Decimal::from(100u64)),
            Err(CdpError::OverRepayment)
        );
        assert_eq!(
            check_repayment_bound(Decimal::from(100u64), Decimal::from(100u64)),
            Ok(())
        );
    }

    #[test]
    fn settlement_rejects_dust_remainder() {
        assert_eq!(
            check_remaining_debt(Decimal::from(99u64), &config()),
            Err(CdpError::BelowDebtFloor)
        );
        assert_eq!(check_remaining_debt(Decimal::zero(), &config()), Ok(()));
        assert_eq!(
            check_remaining_debt(Decimal::from(100u64), &config()),
            Ok(())
        );
    }
}
