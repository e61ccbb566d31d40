#![allow(clippy::arithmetic_side_effects)]
#![warn(missing_docs)]
#![no_std]

//! A stablecoin debt-position engine for the casper blockchain.
//!
//! The crate is split into a pure calculation core and a thin storage layer.
//! Everything under [`math`], [`state`], [`fees`], [`validation`] and
//! [`processor`] is deterministic: each debt operation maps a position
//! snapshot plus a market context to a new position value or a typed error,
//! without touching storage or the host environment. The [`manager`] module
//! is the on-chain surface that persists positions, feeds prices and
//! forwards every decision to the core.

pub mod error;
pub mod fees;
pub mod manager;
pub mod math;
pub mod processor;
pub mod state;
pub mod validation;

extern crate alloc;
