//! Margin manager: the single-pass transform from a subaccount snapshot to
//! the complete `AccountSummary`.
//!
//! Health, margin usage, leverage and per-position metrics all come out of
//! one `calculate_account_summary` call. The manager holds only what the
//! caller hands it (snapshot, optional indexer events, config); it performs
//! no I/O and mutates nothing, so repeat invocations on the same snapshot
//! return bit-identical results.

use crate::balance::{perp_notional, spot_value, Balance, IsolatedPosition, ProductWeights};
use crate::config::MarginConfig;
use crate::fixed_point::FixedPoint;
use crate::health::{
    aggregate_health, balance_health_contribution, balance_weighted_value, HealthKind,
    HealthMetrics,
};
use crate::types::{ProductId, Timestamp};
use serde::{Deserialize, Serialize};

// 7.0: inputs. a snapshot is immutable once handed over; "state" lives here
// and only here.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountSnapshot {
    /// Subaccount identifier, as the engine reports it.
    pub subaccount: String,
    pub taken_at: Timestamp,
    /// All cross-margin balances, spot and perp.
    pub balances: Vec<Balance>,
    pub isolated_positions: Vec<IsolatedPosition>,
}

/// One indexer snapshot event. Only feeds estimated PnL; health and margin
/// figures never depend on these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerSnapshotEvent {
    pub product_id: ProductId,
    pub isolated: bool,
    /// Net entry cost of the open position, excluding funding and fees.
    pub net_entry_unrealized: FixedPoint,
}

// 7.1: estimated PnL is either known from indexer data or explicitly
// unknown. "no data" is never reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstPnl {
    Known(FixedPoint),
    Unknown,
}

impl EstPnl {
    pub fn is_known(&self) -> bool {
        matches!(self, EstPnl::Known(_))
    }
}

// 7.2: leverage of an isolated position. a position with zero net margin has
// no meaningful leverage; that is a distinct outcome, not infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolatedLeverage {
    Defined(FixedPoint),
    Undefined,
}

impl IsolatedLeverage {
    pub fn is_defined(&self) -> bool {
        matches!(self, IsolatedLeverage::Defined(_))
    }
}

// 7.3: per-position report rows.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossPositionMetrics {
    pub product_id: ProductId,
    pub position_size: FixedPoint,
    pub notional_value: FixedPoint,
    pub est_pnl: EstPnl,
    /// Full position value including the unsettled quote leg.
    pub unsettled: FixedPoint,
    /// Initial margin the position consumes, PnL excluded.
    pub margin_used: FixedPoint,
    pub initial_health: FixedPoint,
    pub maintenance_health: FixedPoint,
    pub weights: ProductWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolatedPositionMetrics {
    pub product_id: ProductId,
    pub position_size: FixedPoint,
    pub notional_value: FixedPoint,
    pub net_margin: FixedPoint,
    pub leverage: IsolatedLeverage,
    pub initial_health: FixedPoint,
    pub maintenance_health: FixedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarginUsageFractions {
    pub initial: FixedPoint,
    pub maintenance: FixedPoint,
}

// 7.4: the complete account summary. a value, produced once per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub initial_health: FixedPoint,
    pub maintenance_health: FixedPoint,
    pub unweighted_health: FixedPoint,

    /// Fraction of margin capacity in use, in [0, 1].
    pub margin_usage_fraction: FixedPoint,
    pub maint_margin_usage_fraction: FixedPoint,

    pub funds_available: FixedPoint,
    pub funds_until_liquidation: FixedPoint,

    pub portfolio_value: FixedPoint,
    pub account_leverage: FixedPoint,

    pub cross_positions: Vec<CrossPositionMetrics>,
    pub isolated_positions: Vec<IsolatedPositionMetrics>,
    pub spot_positions: Vec<Balance>,

    pub total_spot_deposits: FixedPoint,
    pub total_spot_borrows: FixedPoint,
}

// 7.5: the orchestrator.

#[derive(Debug, Clone)]
pub struct MarginManager {
    snapshot: SubaccountSnapshot,
    indexer_events: Vec<IndexerSnapshotEvent>,
    config: MarginConfig,
}

impl MarginManager {
    pub fn new(snapshot: SubaccountSnapshot) -> Self {
        Self {
            snapshot,
            indexer_events: Vec::new(),
            config: MarginConfig::default(),
        }
    }

    /// Attach indexer snapshot events for estimated-PnL calculation.
    pub fn with_indexer_events(mut self, events: Vec<IndexerSnapshotEvent>) -> Self {
        self.indexer_events = events;
        self
    }

    pub fn with_config(mut self, config: MarginConfig) -> Self {
        self.config = config;
        self
    }

    pub fn snapshot(&self) -> &SubaccountSnapshot {
        &self.snapshot
    }

    /// The whole pipeline: valuation, health aggregation, per-position
    /// metrics, usage fractions, leverage.
    pub fn calculate_account_summary(&self) -> AccountSummary {
        let health = aggregate_health(&self.snapshot.balances).health();

        let usage = self.margin_usage_fractions(&health);

        let spot_positions: Vec<Balance> = self
            .snapshot
            .balances
            .iter()
            .filter(|b| b.is_spot())
            .copied()
            .collect();

        let cross_positions: Vec<CrossPositionMetrics> = self
            .snapshot
            .balances
            .iter()
            .filter(|b| b.is_perp() && !b.amount.is_zero())
            .map(|b| self.cross_position_metrics(b))
            .collect();

        let isolated_positions: Vec<IsolatedPositionMetrics> = self
            .snapshot
            .isolated_positions
            .iter()
            .map(Self::isolated_position_metrics)
            .collect();
        let total_iso_net_margin: FixedPoint =
            isolated_positions.iter().map(|p| p.net_margin).sum();

        let mut total_spot_deposits = FixedPoint::ZERO;
        let mut total_spot_borrows = FixedPoint::ZERO;
        for balance in &spot_positions {
            let value = spot_value(balance.amount, balance.oracle_price);
            if value.is_negative() {
                total_spot_borrows += value.abs();
            } else {
                total_spot_deposits += value;
            }
        }

        let account_leverage = self.account_leverage(health.unweighted);

        // isolated positions sit outside the cross pool; their net margin is
        // added to portfolio value separately
        let portfolio_value = health.unweighted + total_iso_net_margin;

        AccountSummary {
            initial_health: health.initial,
            maintenance_health: health.maintenance,
            unweighted_health: health.unweighted,
            margin_usage_fraction: usage.initial,
            maint_margin_usage_fraction: usage.maintenance,
            funds_available: health.initial.max(FixedPoint::ZERO),
            funds_until_liquidation: health.maintenance.max(FixedPoint::ZERO),
            portfolio_value,
            account_leverage,
            cross_positions,
            isolated_positions,
            spot_positions,
            total_spot_deposits,
            total_spot_borrows,
        }
    }

    /// Margin usage as a fraction of unweighted health, clamped to [0, 1].
    /// Both fractions are exactly zero for an account with no borrows and no
    /// perp positions, whatever its portfolio is worth.
    pub fn margin_usage_fractions(&self, health: &HealthMetrics) -> MarginUsageFractions {
        if !health.unweighted.is_positive() || !self.has_borrows_or_perps() {
            return MarginUsageFractions::default();
        }
        let usage = |h: FixedPoint| clamp_unit((health.unweighted - h) / health.unweighted);
        MarginUsageFractions {
            initial: usage(health.initial),
            maintenance: usage(health.maintenance),
        }
    }

    /// Total notional of directional exposure over unweighted health. The
    /// quote asset has no directional risk and never enters the numerator.
    pub fn account_leverage(&self, unweighted_health: FixedPoint) -> FixedPoint {
        if unweighted_health.is_zero() || !self.has_borrows_or_perps() {
            return FixedPoint::ZERO;
        }

        let mut numerator = FixedPoint::ZERO;
        for balance in &self.snapshot.balances {
            if balance.product_id == self.config.quote_product_id || is_zero_health(balance) {
                continue;
            }
            numerator += perp_notional(balance.amount, balance.oracle_price);
        }
        numerator / unweighted_health
    }

    fn cross_position_metrics(&self, balance: &Balance) -> CrossPositionMetrics {
        let notional = perp_notional(balance.amount, balance.oracle_price);

        // margin used excludes unsettled PnL: the leverage adjustment comes
        // off the long initial weight regardless of direction
        let adjustment = FixedPoint::ONE - balance.weights.long_initial;
        let margin_used = (notional * adjustment).abs();

        CrossPositionMetrics {
            product_id: balance.product_id,
            position_size: balance.amount,
            notional_value: notional,
            est_pnl: self.est_pnl(balance),
            unsettled: balance_health_contribution(balance, HealthKind::Unweighted),
            margin_used,
            initial_health: balance_weighted_value(balance, HealthKind::Initial),
            maintenance_health: balance_weighted_value(balance, HealthKind::Maintenance),
            weights: balance.weights,
        }
    }

    /// Estimated PnL from indexer data: current value minus the net entry
    /// cost. Unknown when no matching cross event exists.
    fn est_pnl(&self, balance: &Balance) -> EstPnl {
        if balance.product_id == self.config.quote_product_id {
            return EstPnl::Unknown;
        }
        for event in &self.indexer_events {
            if event.product_id != balance.product_id || event.isolated {
                continue;
            }
            let current_value = spot_value(balance.amount, balance.oracle_price);
            return EstPnl::Known(current_value - event.net_entry_unrealized);
        }
        EstPnl::Unknown
    }

    fn isolated_position_metrics(position: &IsolatedPosition) -> IsolatedPositionMetrics {
        let base = position.base_balance();
        let net_margin = position.quote_amount + position.unsettled_pnl;
        let notional = perp_notional(position.position_size, position.oracle_price);

        let leverage = match notional.checked_div(net_margin) {
            Some(value) => IsolatedLeverage::Defined(value),
            None => IsolatedLeverage::Undefined,
        };

        // the position's own pool: dedicated quote margin at weight 1 plus
        // the base leg under its product weights
        let initial_health =
            position.quote_amount + balance_health_contribution(&base, HealthKind::Initial);
        let maintenance_health =
            position.quote_amount + balance_health_contribution(&base, HealthKind::Maintenance);

        IsolatedPositionMetrics {
            product_id: position.product_id,
            position_size: position.position_size,
            notional_value: notional,
            net_margin,
            leverage,
            initial_health,
            maintenance_health,
        }
    }

    fn has_borrows_or_perps(&self) -> bool {
        self.snapshot.balances.iter().any(|b| {
            if b.is_spot() {
                b.amount.is_negative()
            } else {
                !b.amount.is_zero()
            }
        })
    }
}

// products configured with no collateral value at all (long weight 0, short
// weight 2) are skipped in the leverage numerator
fn is_zero_health(balance: &Balance) -> bool {
    balance.weights.long_initial.is_zero()
        && balance.weights.short_initial == FixedPoint::from_int(2)
}

fn clamp_unit(value: FixedPoint) -> FixedPoint {
    value.max(FixedPoint::ZERO).min(FixedPoint::ONE)
}
