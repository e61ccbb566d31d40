//! The position aggregate and its lifecycle.

use odra::prelude::*;

use crate::error::CdpError;
use crate::math::{Decimal, Rate, TryAdd, TryDiv, TryMul};
use crate::state::config::CollateralConfig;

/// Lifecycle state of a position.
///
/// `Closed` is terminal. `Frozen` blocks mutation but remains readable;
/// only the emergency switch moves a position in or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdpState {
    /// Open and at or above the liquidation boundary.
    Active {
        /// Health factor cached at the last debt mutation.
        health_factor: Decimal,
    },
    /// Health dropped below the liquidation boundary.
    Liquidatable,
    /// Suspended; refuses every mint and burn.
    Frozen,
    /// Debt fully repaid; cannot be reopened.
    Closed,
}

impl CdpState {
    /// True for states that accept debt mutations.
    pub fn is_mutable(&self) -> bool {
        matches!(self, CdpState::Active { .. } | CdpState::Liquidatable)
    }

    /// True once the position is closed for good.
    pub fn is_closed(&self) -> bool {
        matches!(self, CdpState::Closed)
    }

    /// Storage tag for the state.
    pub fn tag(&self) -> u8 {
        match self {
            CdpState::Active { .. } => 0,
            CdpState::Liquidatable => 1,
            CdpState::Frozen => 2,
            CdpState::Closed => 3,
        }
    }

    /// Rebuild a state from its storage tag and the cached health factor.
    /// Unknown tags yield `None`.
    pub fn from_tag(tag: u8, health_factor: Decimal) -> Option<CdpState> {
        match tag {
            0 => Some(CdpState::Active { health_factor }),
            1 => Some(CdpState::Liquidatable),
            2 => Some(CdpState::Frozen),
            3 => Some(CdpState::Closed),
            _ => None,
        }
    }
}

/// A collateralized debt position.
///
/// Debt operations never mutate a position in place: each one takes a
/// snapshot and produces a fresh value, so a failed operation leaves the
/// caller's copy untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cdp {
    /// Account that owns the position.
    pub owner: Address,
    /// Locked collateral, in collateral units.
    pub collateral_amount: Decimal,
    /// Outstanding principal debt, in stablecoin units.
    pub debt_amount: Decimal,
    /// Stability fees accrued but not yet folded into debt or paid.
    pub accrued_fees: Decimal,
    /// Lifecycle state.
    pub state: CdpState,
    /// Risk parameters snapshotted from the collateral class.
    pub config: CollateralConfig,
    /// Creation time, in seconds.
    pub created_at: u64,
    /// Time of the last debt mutation, in seconds.
    pub updated_at: u64,
}

impl Cdp {
    /// Open a debt-free position.
    pub fn open(
        owner: Address,
        collateral_amount: Decimal,
        config: CollateralConfig,
        timestamp: u64,
    ) -> Self {
        Self {
            owner,
            collateral_amount,
            debt_amount: Decimal::zero(),
            accrued_fees: Decimal::zero(),
            state: CdpState::Active {
                health_factor: Decimal::max_value(),
            },
            config,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Principal plus accrued-but-unpaid fees.
    pub fn total_owed(&self) -> Result<Decimal, CdpError> {
        self.debt_amount.try_add(self.accrued_fees)
    }
}

/// Collateralization health against the liquidation boundary.
///
/// `(collateral * price) / (debt * liquidation_ratio)`. At or above 1.0 the
/// position is safe. A debt-free position reports the maximal sentinel
/// value: with nothing owed there is nothing to liquidate.
pub fn health_factor(
    collateral_amount: Decimal,
    debt_amount: Decimal,
    collateral_price: Decimal,
    liquidation_ratio: Rate,
) -> Result<Decimal, CdpError> {
    if debt_amount == Decimal::zero() {
        return Ok(Decimal::max_value());
    }
    let collateral_value = collateral_amount.try_mul(collateral_price)?;
    let liability_value = debt_amount.try_mul(liquidation_ratio)?;
    collateral_value.try_div(liability_value)
}

/// Lifecycle state after a debt mutation.
///
/// `Closed` and `Frozen` map to themselves: nothing but the emergency
/// switch leaves `Frozen`, and nothing leaves `Closed`. Otherwise a fully
/// repaid position closes when `auto_close` is set, an unhealthy one
/// becomes `Liquidatable`, and a healthy one is `Active` with the new
/// health factor cached.
pub fn next_state(
    current: CdpState,
    new_health_factor: Decimal,
    remaining_debt: Decimal,
    remaining_fees: Decimal,
    auto_close: bool,
) -> CdpState {
    match current {
        CdpState::Closed => CdpState::Closed,
        CdpState::Frozen => CdpState::Frozen,
        CdpState::Active { .. } | CdpState::Liquidatable => {
            if auto_close
                && remaining_debt == Decimal::zero()
                && remaining_fees == Decimal::zero()
            {
                CdpState::Closed
            } else if new_health_factor < Decimal::one() {
                CdpState::Liquidatable
            } else {
                CdpState::Active {
                    health_factor: new_health_factor,
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn health_factor_formula() {
        // 2 collateral at price 2000 against 2000 debt with a 130%
        // liquidation ratio: 4000 / 2600 = 1.538461...
        let hf = health_factor(
            Decimal::from(2u64),
            Decimal::from(2000u64),
            Decimal::from(2000u64),
            Rate::from_percent(130),
        )
        .unwrap();
        assert_eq!(hf.to_scaled_val(), 1_538_461_538_461_538_461);
    }

    #[test]
    fn health_factor_at_boundary() {
        // 1.3 collateral value per unit of debt at a 130% ratio is exactly 1.0.
        let hf = health_factor(
            Decimal::from(13u64),
            Decimal::from(10u64),
            Decimal::one(),
            Rate::from_percent(130),
        )
        .unwrap();
        assert_eq!(hf, Decimal::one());
    }

    #[test]
    fn health_factor_no_debt_is_maximal() {
        let hf = health_factor(
            Decimal::from(2u64),
            Decimal::zero(),
            Decimal::from(2000u64),
            Rate::from_percent(130),
        )
        .unwrap();
        assert_eq!(hf, Decimal::max_value());
    }

    #[test]
    fn next_state_closes_on_full_repayment() {
        let state = next_state(
            CdpState::Active {
                health_factor: Decimal::one(),
            },
            Decimal::max_value(),
            Decimal::zero(),
            Decimal::zero(),
            true,
        );
        assert_eq!(state, CdpState::Closed);
    }

    #[test]
    fn next_state_keeps_open_without_auto_close() {
        let state = next_state(
            CdpState::Active {
                health_factor: Decimal::one(),
            },
            Decimal::max_value(),
            Decimal::zero(),
            Decimal::zero(),
            false,
        );
        assert_eq!(
            state,
            CdpState::Active {
                health_factor: Decimal::max_value()
            }
        );
    }

    #[test]
    fn next_state_keeps_open_with_outstanding_fees() {
        // Zero principal with fee dust outstanding must not close.
        let state = next_state(
            CdpState::Active {
                health_factor: Decimal::one(),
            },
            Decimal::max_value(),
            Decimal::zero(),
            Decimal::from_scaled_val(1),
            true,
        );
        assert_ne!(state, CdpState::Closed);
    }

    #[test]
    fn next_state_flags_unhealthy_positions() {
        let under_one = Decimal::from_scaled_val(999_999_999_999_999_999);
        let state = next_state(
            CdpState::Active {
                health_factor: Decimal::one(),
            },
            under_one,
            Decimal::from(500u64),
            Decimal::zero(),
            false,
        );
        assert_eq!(state, CdpState::Liquidatable);
    }

    #[test]
    fn next_state_recovers_liquidatable_positions() {
        let state = next_state(
            CdpState::Liquidatable,
            Decimal::from(2u64),
            Decimal::from(500u64),
            Decimal::zero(),
            false,
        );
        assert_eq!(
            state,
            CdpState::Active {
                health_factor: Decimal::from(2u64)
            }
        );
    }

    #[test]
    fn next_state_never_leaves_terminal_states() {
        let healthy = Decimal::from(2u64);
        assert_eq!(
            next_state(CdpState::Closed, healthy, Decimal::zero(), Decimal::zero(), true),
            CdpState::Closed
        );
        assert_eq!(
            next_state(CdpState::Frozen, healthy, Decimal::zero(), Decimal::zero(), true),
            CdpState::Frozen
        );
    }

    #[test]
    fn state_tags_round_trip() {
        let states = [
            CdpState::Active {
                health_factor: Decimal::from(2u64),
            },
            CdpState::Liquidatable,
            CdpState::Frozen,
            CdpState::Closed,
        ];
        for state in states {
            let rebuilt = CdpState::from_tag(state.tag(), Decimal::from(2u64)).unwrap();
            assert_eq!(rebuilt, state);
        }
        assert_eq!(CdpState::from_tag(9, Decimal::zero()), None);
    }
}
