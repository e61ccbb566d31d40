use odra::prelude::*;
use core::fmt;

/// Errors returned by the debt engine and its storage surface.
///
/// Every expected failure mode is a value; the engine never panics on bad
/// input. Business-rule variants originate in the validation pipeline,
/// arithmetic variants originate in the math module and propagate unchanged.
#[odra::odra_error]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CdpError {
    // 0
    /// Initiator does not own the position
    Unauthorized = 0,
    /// Amount is zero or exceeds the per-operation maximum
    InvalidAmount = 1,
    /// Resulting nonzero debt would sit under the collateral class floor
    BelowDebtFloor = 2,
    /// Resulting debt would exceed the position or system ceiling
    DebtCeilingExceeded = 3,
    /// Mint would leave the position below its liquidation boundary
    InsufficientHealthFactor = 4,

    // 5
    /// Burn amount exceeds outstanding fees plus principal
    OverRepayment = 5,
    /// Position is closed and cannot be reopened
    CdpClosed = 6,
    /// Position is frozen and refuses mutation
    CdpFrozen = 7,
    /// System-wide halt is in effect
    EmergencyShutdownActive = 8,
    /// A fixed-point operation overflowed its backing width
    MathOverflow = 9,

    // 10
    /// A fixed-point subtraction would have gone negative
    MathUnderflow = 10,
    /// Collateral class parameters are out of range
    InvalidConfig = 11,
    /// No position is stored for the given owner
    PositionNotFound = 12,
    /// The owner already has an open position
    PositionAlreadyExists = 13,
    /// Price push rejected: unauthorized feeder or zero price
    InvalidOracleFeed = 14,

    // 15
    /// Stored collateral price is older than the configured maximum age
    StalePrice = 15,
}

impl CdpError {
    /// Human readable description of the error.
    pub fn message(&self) -> &str {
        match self {
            CdpError::Unauthorized => "Initiator does not own this position",
            CdpError::InvalidAmount => "Operation amount is invalid",
            CdpError::BelowDebtFloor => "Resulting debt would be below the debt floor",
            CdpError::DebtCeilingExceeded => "Resulting debt would exceed a debt ceiling",
            CdpError::InsufficientHealthFactor => "Position would fall below its liquidation boundary",
            CdpError::OverRepayment => "Burn amount exceeds the total owed",
            CdpError::CdpClosed => "Position is closed",
            CdpError::CdpFrozen => "Position is frozen",
            CdpError::EmergencyShutdownActive => "Emergency shutdown is active",
            CdpError::MathOverflow => "Math operation overflow",
            CdpError::MathUnderflow => "Math operation underflow",
            CdpError::InvalidConfig => "Collateral class configuration is invalid",
            CdpError::PositionNotFound => "No position exists for this owner",
            CdpError::PositionAlreadyExists => "A position already exists for this owner",
            CdpError::InvalidOracleFeed => "Price feed update rejected",
            CdpError::StalePrice => "Collateral price is stale",
        }
    }
}

impl core::fmt::Display for CdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
