//! Checked fixed-point arithmetic used for every monetary quantity.

pub mod common;
pub mod decimal;
pub mod rate;

pub use common::{TryAdd, TryDiv, TryMul, TrySub};
pub use decimal::Decimal;
pub use rate::Rate;
