//! Risk parameters for a collateral class.

use crate::error::CdpError;
use crate::math::{Decimal, Rate};

/// Parameters of the collateral class a position is opened against,
/// snapshotted onto the position when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralConfig {
    /// Collateral-to-debt ratio below which the position becomes
    /// liquidatable, in percent (e.g. 130)
    pub liquidation_ratio_pct: u8,
    /// Collateralization users are expected to maintain, in percent;
    /// must not sit below the liquidation ratio
    pub min_collateral_ratio_pct: u8,
    /// Largest debt a single position may carry
    pub debt_ceiling: Decimal,
    /// Smallest nonzero debt a position may carry; repaying to exactly
    /// zero is always allowed
    pub debt_floor: Decimal,
}

impl CollateralConfig {
    /// Validate the parameter ranges.
    pub fn validate(&self) -> Result<(), CdpError> {
        if self.liquidation_ratio_pct < 100 {
            return Err(CdpError::InvalidConfig);
        }
        if self.min_collateral_ratio_pct < self.liquidation_ratio_pct {
            return Err(CdpError::InvalidConfig);
        }
        if self.debt_floor > self.debt_ceiling {
            return Err(CdpError::InvalidConfig);
        }
        Ok(())
    }

    /// Liquidation boundary as a rate (130% -> 1.3)
    pub fn liquidation_ratio(&self) -> Rate {
        Rate::from_percent(self.liquidation_ratio_pct)
    }

    /// Expected collateralization as a rate
    pub fn min_collateral_ratio(&self) -> Rate {
        Rate::from_percent(self.min_collateral_ratio_pct)
    }
}
