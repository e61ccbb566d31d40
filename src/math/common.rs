//! Shared scalers and arithmetic trait definitions.
//!
//! All amounts, prices and rates in the engine are scaled integers with 18
//! implied decimal places. The traits below are the only arithmetic surface
//! the rest of the crate uses, so scale handling and rounding live in one
//! place: division truncates toward zero.

use crate::error::CdpError;

/// Scale of precision
pub const SCALE: usize = 18;
/// Identity
pub const WAD: u64 = 1_000_000_000_000_000_000;
/// Half of identity
pub const HALF_WAD: u64 = 500_000_000_000_000_000;
/// Scale for percentages
pub const PERCENT_SCALER: u64 = 10_000_000_000_000_000;
/// Scale for basis points
pub const BPS_SCALER: u64 = 100_000_000_000_000;

/// Try to subtract, return an error on underflow
pub trait TrySub: Sized {
    /// Subtract
    fn try_sub(self, rhs: Self) -> Result<Self, CdpError>;
}

/// Try to add, return an error on overflow
pub trait TryAdd: Sized {
    /// Add
    fn try_add(self, rhs: Self) -> Result<Self, CdpError>;
}

/// Try to divide, return an error on overflow or divide by zero
pub trait TryDiv<Rhs = Self>: Sized {
    /// Divide
    fn try_div(self, rhs: Rhs) -> Result<Self, CdpError>;
}

/// Try to multiply, return an error on overflow
pub trait TryMul<Rhs = Self>: Sized {
    /// Multiply
    fn try_mul(self, rhs: Rhs) -> Result<Self, CdpError>;
}
