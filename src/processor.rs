//! Debt operations over position snapshots.
//!
//! Every function in this module is a pure calculation: it takes a position
//! and a read-only context, and returns either a result record carrying a
//! new position value or an error. Persistence, serialization and price
//! sourcing are the caller's business. If two operations race on the same
//! position the caller must serialize them; applying both to the same
//! snapshot would double-count against the ceilings.

use odra::prelude::*;

use crate::error::CdpError;
use crate::fees::accrue_stability_fee;
use crate::math::{Decimal, Rate, TryAdd, TrySub};
use crate::state::{health_factor, next_state, Cdp};
use crate::validation;

/// A mint request: who wants how much, stamped when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    /// Account requesting the mint; must own the position.
    pub initiator: Address,
    /// Stablecoin amount to mint.
    pub amount: Decimal,
    /// Request time, in seconds.
    pub timestamp: u64,
}

/// A burn request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnParams {
    /// Account requesting the burn; must own the position.
    pub initiator: Address,
    /// Stablecoin amount to repay.
    pub amount: Decimal,
    /// Request time, in seconds.
    pub timestamp: u64,
}

/// Market and system snapshot a mint is judged against.
///
/// The engine trusts these figures as one consistent instant: the ceiling
/// check is only as good as the price and the total being from the same
/// moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintContext {
    /// Current collateral price, in stablecoin per collateral unit.
    pub collateral_price: Decimal,
    /// System-wide cap on outstanding debt.
    pub global_debt_ceiling: Decimal,
    /// Outstanding system debt as of the same instant as the price.
    pub total_system_debt: Decimal,
    /// Annual stability fee rate.
    pub stability_fee_rate: Rate,
    /// Seconds since the position last accrued fees.
    pub elapsed_seconds: u64,
    /// Cap on a single requested amount, applied before fee accrual.
    pub max_operation_amount: Decimal,
    /// System-wide halt flag.
    pub emergency_shutdown: bool,
    /// Context clock, in seconds; becomes the position's update time.
    pub current_timestamp: u64,
}

/// Market and system snapshot a burn is judged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnContext {
    /// Current collateral price, in stablecoin per collateral unit.
    pub collateral_price: Decimal,
    /// System-wide cap on outstanding debt.
    pub global_debt_ceiling: Decimal,
    /// Outstanding system debt as of the same instant as the price.
    pub total_system_debt: Decimal,
    /// Annual stability fee rate.
    pub stability_fee_rate: Rate,
    /// Seconds since the position last accrued fees.
    pub elapsed_seconds: u64,
    /// Cap on a single requested amount, applied before fee accrual.
    pub max_operation_amount: Decimal,
    /// System-wide halt flag.
    pub emergency_shutdown: bool,
    /// Context clock, in seconds; becomes the position's update time.
    pub current_timestamp: u64,
    /// Close the position when a burn repays everything owed.
    pub auto_close: bool,
}

/// Outcome of a successful mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintResult {
    /// The updated position.
    pub cdp: Cdp,
    /// Amount actually minted.
    pub minted_amount: Decimal,
    /// Health factor before the operation.
    pub previous_health_factor: Decimal,
    /// Health factor after the operation.
    pub new_health_factor: Decimal,
    /// System debt total after the operation.
    pub new_total_debt: Decimal,
}

/// Outcome of a successful burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnResult {
    /// The updated position.
    pub cdp: Cdp,
    /// Amount actually burned.
    pub burned_amount: Decimal,
    /// Portion of the burn that settled accrued fees.
    pub fees_paid: Decimal,
    /// Portion of the burn that repaid principal.
    pub principal_paid: Decimal,
    /// Health factor before the operation.
    pub previous_health_factor: Decimal,
    /// Health factor after the operation.
    pub new_health_factor: Decimal,
    /// System debt total after the operation.
    pub new_total_debt: Decimal,
    /// Principal debt left on the position.
    pub remaining_debt: Decimal,
    /// True when the burn repaid everything and closed the position.
    pub cdp_closed: bool,
}

/// Increase a position's debt.
///
/// Accrues stability fees for the elapsed interval, folds them together
/// with any carried fees into principal, adds the minted amount, and
/// checks the projected position against the ceilings, the debt floor and
/// the liquidation boundary. The input position is untouched; the result
/// carries the new value.
pub fn mint(cdp: &Cdp, params: &MintParams, ctx: &MintContext) -> Result<MintResult, CdpError> {
    validation::validate_mint(cdp, params, ctx)?;

    let liquidation_ratio = cdp.config.liquidation_ratio();
    let previous_health_factor = health_factor(
        cdp.collateral_amount,
        cdp.total_owed()?,
        ctx.collateral_price,
        liquidation_ratio,
    )?;

    let new_fees =
        accrue_stability_fee(cdp.debt_amount, ctx.stability_fee_rate, ctx.elapsed_seconds)?;
    let folded_fees = cdp.accrued_fees.try_add(new_fees)?;

    let new_debt = cdp
        .debt_amount
        .try_add(folded_fees)?
        .try_add(params.amount)?;
    // Folded fees become real debt, so they count against the global
    // ceiling alongside the minted amount.
    let new_total_debt = ctx
        .total_system_debt
        .try_add(folded_fees)?
        .try_add(params.amount)?;

    let new_health_factor = health_factor(
        cdp.collateral_amount,
        new_debt,
        ctx.collateral_price,
        liquidation_ratio,
    )?;

    validation::check_mint_projection(
        new_debt,
        new_total_debt,
        new_health_factor,
        &cdp.config,
        ctx.global_debt_ceiling,
    )?;

    let state = next_state(
        cdp.state,
        new_health_factor,
        new_debt,
        Decimal::zero(),
        false,
    );

    let updated = Cdp {
        debt_amount: new_debt,
        accrued_fees: Decimal::zero(),
        state,
        updated_at: ctx.current_timestamp,
        ..cdp.clone()
    };

    Ok(MintResult {
        cdp: updated,
        minted_amount: params.amount,
        previous_health_factor,
        new_health_factor,
        new_total_debt,
    })
}

/// Decrease a position's debt.
///
/// Accrues stability fees, then allocates the burn amount to fees first
/// and principal second; fees are always settled before principal moves.
/// A burn of exactly everything owed closes the position when the context
/// enables auto-close. The input position is untouched.
pub fn burn(cdp: &Cdp, params: &BurnParams, ctx: &BurnContext) -> Result<BurnResult, CdpError> {
    validation::validate_burn(cdp, params, ctx)?;

    let liquidation_ratio = cdp.config.liquidation_ratio();
    let previous_health_factor = health_factor(
        cdp.collateral_amount,
        cdp.total_owed()?,
        ctx.collateral_price,
        liquidation_ratio,
    )?;

    let new_fees =
        accrue_stability_fee(cdp.debt_amount, ctx.stability_fee_rate, ctx.elapsed_seconds)?;
    let fees_owed = cdp.accrued_fees.try_add(new_fees)?;
    let total_owed = cdp.debt_amount.try_add(fees_owed)?;

    validation::check_repayment_bound(params.amount, total_owed)?;

    let fees_paid = params.amount.min(fees_owed);
    let principal_paid = params.amount.try_sub(fees_paid)?;

    let remaining_debt = cdp.debt_amount.try_sub(principal_paid)?;
    let remaining_fees = fees_owed.try_sub(fees_paid)?;

    validation::check_remaining_debt(remaining_debt, &cdp.config)?;

    let remaining_owed = remaining_debt.try_add(remaining_fees)?;
    let new_health_factor = health_factor(
        cdp.collateral_amount,
        remaining_owed,
        ctx.collateral_price,
        liquidation_ratio,
    )?;

    // Fee payments retire a receivable rather than minted supply; only the
    // principal portion leaves the system total.
    let new_total_debt = ctx.total_system_debt.try_sub(principal_paid)?;

    let state = next_state(
        cdp.state,
        new_health_factor,
        remaining_debt,
        remaining_fees,
        ctx.auto_close,
    );
    let cdp_closed = state.is_closed();

    let updated = Cdp {
        debt_amount: remaining_debt,
        accrued_fees: remaining_fees,
        state,
        updated_at: ctx.current_timestamp,
        ..cdp.clone()
    };

    Ok(BurnResult {
        cdp: updated,
        burned_amount: params.amount,
        fees_paid,
        principal_paid,
        previous_health_factor,
        new_health_factor,
        new_total_debt,
        remaining_debt,
        cdp_closed,
    })
}

/// Apply a sequence of mints with all-or-nothing semantics.
///
/// Two phases: every request is validated against the shared snapshot
/// before anything is computed, then the entries are applied in order with
/// the running system total threaded through, so the batch as a whole
/// cannot slip past the global ceiling. The first failure aborts the batch;
/// since positions are only ever returned, never written, an aborted batch
/// leaves no trace. Entries are expected to reference distinct positions.
pub fn mint_batch(
    entries: &[(Cdp, MintParams)],
    ctx: &MintContext,
) -> Result<Vec<MintResult>, CdpError> {
    for (cdp, params) in entries {
        validation::validate_mint(cdp, params, ctx)?;
    }

    let mut results = Vec::with_capacity(entries.len());
    let mut running = ctx.clone();
    for (cdp, params) in entries {
        let result = mint(cdp, params, &running)?;
        running.total_system_debt = result.new_total_debt;
        results.push(result);
    }
    Ok(results)
}

/// Apply a sequence of burns with all-or-nothing semantics.
///
/// Same two-phase shape as [`mint_batch`].
pub fn burn_batch(
    entries: &[(Cdp, BurnParams)],
    ctx: &BurnContext,
) -> Result<Vec<BurnResult>, CdpError> {
    for (cdp, params) in entries {
        validation::validate_burn(cdp, params, ctx)?;
    }

    let mut results = Vec::with_capacity(entries.len());
    let mut running = ctx.clone();
    for (cdp, params) in entries {
        let result = burn(cdp, params, &running)?;
        running.total_system_debt = result.new_total_debt;
        results.push(result);
    }
    Ok(results)
}
