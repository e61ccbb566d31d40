//! On-chain surface for the debt engine.
//!
//! [`CdpManager`] owns the storage, the price feed and the emergency
//! switch; every debt decision is delegated to the pure operations in
//! [`crate::processor`]. Positions are keyed by owner account, one per
//! owner. Position fields are stored as primitive values in separate
//! mappings for simplicity.

use odra::prelude::*;

use crate::error::CdpError;
use crate::fees::accrue_stability_fee;
use crate::math::{Decimal, Rate, TryAdd};
use crate::processor::{self, BurnContext, BurnParams, MintContext, MintParams};
use crate::state::{health_factor, Cdp, CdpState, CollateralConfig};

/// Stores positions and system parameters, and forwards debt operations
/// to the engine.
#[odra::module]
pub struct CdpManager {
    // System parameters
    admin: Var<Address>,
    price_feeder: Var<Address>,
    emergency_shutdown: Var<bool>,
    auto_close: Var<bool>,
    global_debt_ceiling: Var<Decimal>,
    total_debt: Var<Decimal>,
    stability_fee_rate: Var<Rate>,
    max_operation_amount: Var<Decimal>,

    // Collateral class parameters
    liquidation_ratio_pct: Var<u8>,
    min_collateral_ratio_pct: Var<u8>,
    position_debt_ceiling: Var<Decimal>,
    position_debt_floor: Var<Decimal>,

    // Price feed
    collateral_price: Var<Decimal>,
    price_updated_at: Var<u64>,
    max_price_age_secs: Var<u64>,

    // Position fields, keyed by owner
    collateral_amounts: Mapping<Address, Decimal>,
    debt_amounts: Mapping<Address, Decimal>,
    fee_balances: Mapping<Address, Decimal>,
    state_tags: Mapping<Address, u8>,
    cached_health: Mapping<Address, Decimal>,
    opened_at: Mapping<Address, u64>,
    updated_at: Mapping<Address, u64>,
}

#[odra::module]
impl CdpManager {
    /// Initialize the manager with its admin, price feeder and risk
    /// parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        admin: Address,
        price_feeder: Address,
        liquidation_ratio_pct: u8,
        min_collateral_ratio_pct: u8,
        position_debt_ceiling: Decimal,
        position_debt_floor: Decimal,
        global_debt_ceiling: Decimal,
        stability_fee_rate: Rate,
        max_operation_amount: Decimal,
        max_price_age_secs: u64,
        auto_close: bool,
    ) {
        let config = CollateralConfig {
            liquidation_ratio_pct,
            min_collateral_ratio_pct,
            debt_ceiling: position_debt_ceiling,
            debt_floor: position_debt_floor,
        };
        if let Err(err) = config.validate() {
            self.env().revert(err);
        }

        self.admin.set(admin);
        self.price_feeder.set(price_feeder);
        self.emergency_shutdown.set(false);
        self.auto_close.set(auto_close);
        self.global_debt_ceiling.set(global_debt_ceiling);
        self.total_debt.set(Decimal::zero());
        self.stability_fee_rate.set(stability_fee_rate);
        self.max_operation_amount.set(max_operation_amount);
        self.liquidation_ratio_pct.set(liquidation_ratio_pct);
        self.min_collateral_ratio_pct.set(min_collateral_ratio_pct);
        self.position_debt_ceiling.set(position_debt_ceiling);
        self.position_debt_floor.set(position_debt_floor);
        self.max_price_age_secs.set(max_price_age_secs);
    }

    // ── Price feed ─────────────────────────────────────────────────────

    /// Push a new collateral price. Only the configured feeder or the
    /// admin may feed, and a zero price is refused outright.
    pub fn update_price(&mut self, price: Decimal) {
        let caller = self.env().caller();
        if Some(caller) != self.price_feeder.get() && Some(caller) != self.admin.get() {
            self.env().revert(CdpError::InvalidOracleFeed);
        }
        if price == Decimal::zero() {
            self.env().revert(CdpError::InvalidOracleFeed);
        }

        let now = self.block_time_secs();
        self.collateral_price.set(price);
        self.price_updated_at.set(now);

        self.env().emit_event(PriceUpdated {
            price,
            feeder: caller,
            timestamp: now,
        });
    }

    /// Hand the feed to a different account.
    pub fn set_price_feeder(&mut self, feeder: Address) {
        self.require_admin();
        self.price_feeder.set(feeder);
    }

    // ── Administration ─────────────────────────────────────────────────

    /// Flip the system-wide halt. While active, every mint and burn is
    /// refused.
    pub fn set_emergency_shutdown(&mut self, active: bool) {
        self.require_admin();
        self.emergency_shutdown.set(active);
        self.env().emit_event(EmergencyShutdown {
            active,
            admin: self.env().caller(),
        });
    }

    /// Change the annual stability fee rate. Positions see the new rate
    /// from their next operation onward.
    pub fn set_stability_fee_rate(&mut self, rate: Rate) {
        self.require_admin();
        self.stability_fee_rate.set(rate);
    }

    /// Change the system-wide debt ceiling.
    pub fn set_global_debt_ceiling(&mut self, ceiling: Decimal) {
        self.require_admin();
        self.global_debt_ceiling.set(ceiling);
    }

    /// Suspend a single position. A frozen position refuses every mint
    /// and burn until thawed.
    pub fn freeze_position(&mut self, owner: Address) {
        self.require_admin();
        self.require_position(&owner);
        self.state_tags.set(&owner, CdpState::Frozen.tag());
        self.env().emit_event(PositionFrozen { owner });
    }

    /// Thaw a frozen position, re-deriving its state from current debt
    /// and price.
    pub fn unfreeze_position(&mut self, owner: Address) {
        self.require_admin();
        self.require_position(&owner);
        if self.state_tags.get(&owner) != Some(CdpState::Frozen.tag()) {
            self.env().revert(CdpError::CdpFrozen);
        }

        let health = self.live_health(&owner);
        let state = if health < Decimal::one() {
            CdpState::Liquidatable
        } else {
            CdpState::Active {
                health_factor: health,
            }
        };
        self.state_tags.set(&owner, state.tag());
        self.cached_health.set(&owner, health);
        self.env().emit_event(PositionThawed { owner });
    }

    // ── Positions ──────────────────────────────────────────────────────

    /// Open a debt-free position for the caller with the given collateral.
    pub fn open_position(&mut self, collateral_amount: Decimal) {
        let caller = self.env().caller();
        if self.collateral_amounts.get(&caller).is_some() {
            self.env().revert(CdpError::PositionAlreadyExists);
        }
        if collateral_amount == Decimal::zero() {
            self.env().revert(CdpError::InvalidAmount);
        }
        if self.emergency_shutdown.get_or_default() {
            self.env().revert(CdpError::EmergencyShutdownActive);
        }

        let now = self.block_time_secs();
        let cdp = Cdp::open(caller, collateral_amount, self.collateral_config(), now);
        self.store_position(&caller, &cdp);

        self.env().emit_event(PositionOpened {
            owner: caller,
            collateral_amount,
            timestamp: now,
        });
    }

    /// Add collateral to the caller's position. Topping up never hurts
    /// health, so no projection check is needed; the fee clock is not
    /// touched.
    pub fn deposit_collateral(&mut self, amount: Decimal) {
        let caller = self.env().caller();
        self.require_position(&caller);
        if amount == Decimal::zero() {
            self.env().revert(CdpError::InvalidAmount);
        }
        if self.emergency_shutdown.get_or_default() {
            self.env().revert(CdpError::EmergencyShutdownActive);
        }
        if self.state_tags.get(&caller) == Some(CdpState::Closed.tag()) {
            self.env().revert(CdpError::CdpClosed);
        }

        let balance = self.collateral_amounts.get(&caller).unwrap_or_default();
        match balance.try_add(amount) {
            Ok(new_balance) => self.collateral_amounts.set(&caller, new_balance),
            Err(err) => self.env().revert(err),
        }

        self.env().emit_event(CollateralDeposited {
            owner: caller,
            amount,
        });
    }

    /// Mint stablecoin debt against the caller's collateral.
    pub fn mint(&mut self, amount: Decimal) {
        let caller = self.env().caller();
        let now = self.block_time_secs();
        let cdp = self.load_position(&caller);
        let ctx = self.mint_context(&cdp, now);
        let params = MintParams {
            initiator: caller,
            amount,
            timestamp: now,
        };

        match processor::mint(&cdp, &params, &ctx) {
            Ok(result) => {
                self.store_position(&caller, &result.cdp);
                self.total_debt.set(result.new_total_debt);
                self.env().emit_event(DebtMinted {
                    owner: caller,
                    amount,
                    new_debt: result.cdp.debt_amount,
                    health_factor: result.new_health_factor,
                });
            }
            Err(err) => self.env().revert(err),
        }
    }

    /// Repay stablecoin debt; fees are settled before principal. With
    /// auto-close enabled, repaying everything owed closes the position.
    pub fn burn(&mut self, amount: Decimal) {
        let caller = self.env().caller();
        let now = self.block_time_secs();
        let cdp = self.load_position(&caller);
        let ctx = self.burn_context(&cdp, now);
        let params = BurnParams {
            initiator: caller,
            amount,
            timestamp: now,
        };

        match processor::burn(&cdp, &params, &ctx) {
            Ok(result) => {
                self.store_position(&caller, &result.cdp);
                self.total_debt.set(result.new_total_debt);
                self.env().emit_event(DebtBurned {
                    owner: caller,
                    amount,
                    fees_paid: result.fees_paid,
                    principal_paid: result.principal_paid,
                    remaining_debt: result.remaining_debt,
                });
                if result.cdp_closed {
                    self.env().emit_event(PositionClosed {
                        owner: caller,
                        timestamp: now,
                    });
                }
            }
            Err(err) => self.env().revert(err),
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Collateral locked in a position.
    pub fn collateral_of(&self, owner: Address) -> Option<Decimal> {
        self.collateral_amounts.get(&owner)
    }

    /// Principal debt of a position, excluding unpaid fees.
    pub fn debt_of(&self, owner: Address) -> Option<Decimal> {
        self.debt_amounts.get(&owner)
    }

    /// Everything a position owes right now: principal, carried fees, and
    /// interest accrued since the last operation.
    pub fn total_owed_of(&self, owner: Address) -> Option<Decimal> {
        let debt = self.debt_amounts.get(&owner)?;
        let fees = self.fee_balances.get(&owner).unwrap_or_default();
        let updated = self.updated_at.get(&owner).unwrap_or_default();
        let elapsed = self.block_time_secs().saturating_sub(updated);
        let pending = accrue_stability_fee(
            debt,
            self.stability_fee_rate.get_or_default(),
            elapsed,
        )
        .ok()?;
        debt.try_add(fees).ok()?.try_add(pending).ok()
    }

    /// Live health factor of a position at the stored price.
    pub fn health_factor_of(&self, owner: Address) -> Option<Decimal> {
        self.collateral_amounts.get(&owner)?;
        Some(self.live_health(&owner))
    }

    /// Storage tag of the position's lifecycle state.
    pub fn state_of(&self, owner: Address) -> Option<u8> {
        self.state_tags.get(&owner)
    }

    /// Outstanding system debt.
    pub fn total_debt(&self) -> Decimal {
        self.total_debt.get_or_default()
    }

    /// Last pushed collateral price.
    pub fn collateral_price(&self) -> Decimal {
        self.collateral_price.get_or_default()
    }

    /// Whether the system-wide halt is in effect.
    pub fn is_shutdown(&self) -> bool {
        self.emergency_shutdown.get_or_default()
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn require_admin(&self) {
        if Some(self.env().caller()) != self.admin.get() {
            self.env().revert(CdpError::Unauthorized);
        }
    }

    fn require_position(&self, owner: &Address) {
        if self.collateral_amounts.get(owner).is_none() {
            self.env().revert(CdpError::PositionNotFound);
        }
    }

    /// Block time is milliseconds on this chain.
    fn block_time_secs(&self) -> u64 {
        self.env().get_block_time() / 1_000
    }

    fn collateral_config(&self) -> CollateralConfig {
        CollateralConfig {
            liquidation_ratio_pct: self.liquidation_ratio_pct.get_or_default(),
            min_collateral_ratio_pct: self.min_collateral_ratio_pct.get_or_default(),
            debt_ceiling: self.position_debt_ceiling.get_or_default(),
            debt_floor: self.position_debt_floor.get_or_default(),
        }
    }

    fn load_position(&self, owner: &Address) -> Cdp {
        self.require_position(owner);
        let tag = self.state_tags.get(owner).unwrap_or_default();
        let health = self.cached_health.get(owner).unwrap_or_default();
        // Unknown tags refuse mutation.
        let state = CdpState::from_tag(tag, health).unwrap_or(CdpState::Frozen);
        Cdp {
            owner: *owner,
            collateral_amount: self.collateral_amounts.get(owner).unwrap_or_default(),
            debt_amount: self.debt_amounts.get(owner).unwrap_or_default(),
            accrued_fees: self.fee_balances.get(owner).unwrap_or_default(),
            state,
            config: self.collateral_config(),
            created_at: self.opened_at.get(owner).unwrap_or_default(),
            updated_at: self.updated_at.get(owner).unwrap_or_default(),
        }
    }

    fn store_position(&mut self, owner: &Address, cdp: &Cdp) {
        self.collateral_amounts.set(owner, cdp.collateral_amount);
        self.debt_amounts.set(owner, cdp.debt_amount);
        self.fee_balances.set(owner, cdp.accrued_fees);
        self.state_tags.set(owner, cdp.state.tag());
        let health = match cdp.state {
            CdpState::Active { health_factor } => health_factor,
            _ => self.cached_health.get(owner).unwrap_or_default(),
        };
        self.cached_health.set(owner, health);
        self.opened_at.set(owner, cdp.created_at);
        self.updated_at.set(owner, cdp.updated_at);
    }

    /// Price, refused when zero or older than the configured maximum age.
    fn fresh_price(&self, now: u64) -> Decimal {
        let price = self.collateral_price.get_or_default();
        if price == Decimal::zero() {
            self.env().revert(CdpError::InvalidOracleFeed);
        }
        let updated = self.price_updated_at.get_or_default();
        if now < updated || now - updated > self.max_price_age_secs.get_or_default() {
            self.env().revert(CdpError::StalePrice);
        }
        price
    }

    fn elapsed_since(&self, updated_at: u64, now: u64) -> u64 {
        if now < updated_at {
            self.env().revert(CdpError::MathUnderflow);
        }
        now - updated_at
    }

    fn live_health(&self, owner: &Address) -> Decimal {
        let collateral = self.collateral_amounts.get(owner).unwrap_or_default();
        let debt = self.debt_amounts.get(owner).unwrap_or_default();
        let fees = self.fee_balances.get(owner).unwrap_or_default();
        let owed = match debt.try_add(fees) {
            Ok(owed) => owed,
            Err(_) => return Decimal::zero(),
        };
        let config = self.collateral_config();
        match health_factor(
            collateral,
            owed,
            self.collateral_price.get_or_default(),
            config.liquidation_ratio(),
        ) {
            Ok(health) => health,
            Err(_) => Decimal::zero(),
        }
    }

    fn mint_context(&self, cdp: &Cdp, now: u64) -> MintContext {
        MintContext {
            collateral_price: self.fresh_price(now),
            global_debt_ceiling: self.global_debt_ceiling.get_or_default(),
            total_system_debt: self.total_debt.get_or_default(),
            stability_fee_rate: self.stability_fee_rate.get_or_default(),
            elapsed_seconds: self.elapsed_since(cdp.updated_at, now),
            max_operation_amount: self.max_operation_amount.get_or_default(),
            emergency_shutdown: self.emergency_shutdown.get_or_default(),
            current_timestamp: now,
        }
    }

    fn burn_context(&self, cdp: &Cdp, now: u64) -> BurnContext {
        BurnContext {
            collateral_price: self.fresh_price(now),
            global_debt_ceiling: self.global_debt_ceiling.get_or_default(),
            total_system_debt: self.total_debt.get_or_default(),
            stability_fee_rate: self.stability_fee_rate.get_or_default(),
            elapsed_seconds: self.elapsed_since(cdp.updated_at, now),
            max_operation_amount: self.max_operation_amount.get_or_default(),
            emergency_shutdown: self.emergency_shutdown.get_or_default(),
            current_timestamp: now,
            auto_close: self.auto_close.get_or_default(),
        }
    }
}

// ── Events ─────────────────────────────────────────────────────────────

/// A new position was opened.
#[odra::event]
pub struct PositionOpened {
    /// Position owner.
    pub owner: Address,
    /// Initial collateral.
    pub collateral_amount: Decimal,
    /// Open time, seconds.
    pub timestamp: u64,
}

/// Collateral was added to a position.
#[odra::event]
pub struct CollateralDeposited {
    /// Position owner.
    pub owner: Address,
    /// Collateral added.
    pub amount: Decimal,
}

/// Debt was minted against a position.
#[odra::event]
pub struct DebtMinted {
    /// Position owner.
    pub owner: Address,
    /// Amount minted.
    pub amount: Decimal,
    /// Principal debt after the mint.
    pub new_debt: Decimal,
    /// Health factor after the mint.
    pub health_factor: Decimal,
}

/// Debt was repaid on a position.
#[odra::event]
pub struct DebtBurned {
    /// Position owner.
    pub owner: Address,
    /// Amount burned.
    pub amount: Decimal,
    /// Portion that settled fees.
    pub fees_paid: Decimal,
    /// Portion that repaid principal.
    pub principal_paid: Decimal,
    /// Principal left after the burn.
    pub remaining_debt: Decimal,
}

/// A position was fully repaid and closed.
#[odra::event]
pub struct PositionClosed {
    /// Position owner.
    pub owner: Address,
    /// Close time, seconds.
    pub timestamp: u64,
}

/// A position was suspended by the admin.
#[odra::event]
pub struct PositionFrozen {
    /// Position owner.
    pub owner: Address,
}

/// A suspended position was thawed.
#[odra::event]
pub struct PositionThawed {
    /// Position owner.
    pub owner: Address,
}

/// The collateral price was updated.
#[odra::event]
pub struct PriceUpdated {
    /// New price.
    pub price: Decimal,
    /// Account that pushed it.
    pub feeder: Address,
    /// Push time, seconds.
    pub timestamp: u64,
}

/// The system-wide halt was flipped.
#[odra::event]
pub struct EmergencyShutdown {
    /// New flag value.
    pub active: bool,
    /// Admin who flipped it.
    pub admin: Address,
}
