//! Health calculation: weighted assets minus liabilities, per regime.
//!
//! Every balance contributes `amount x oracle_price x weight` plus its
//! unsettled quote leg. The weight is picked by position direction (long
//! weights haircut assets below 1, short weights mark liabilities above 1)
//! and by regime: initial is strictest, maintenance gates liquidation,
//! unweighted applies no haircut at all and therefore equals raw signed
//! portfolio value.

use crate::balance::Balance;
use crate::fixed_point::FixedPoint;
use serde::{Deserialize, Serialize};

// 6.0: the three health regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthKind {
    Initial,
    Maintenance,
    Unweighted,
}

pub const HEALTH_KINDS: [HealthKind; 3] = [
    HealthKind::Initial,
    HealthKind::Maintenance,
    HealthKind::Unweighted,
];

// 6.1: one figure per regime, for a single balance or an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub initial: FixedPoint,
    pub maintenance: FixedPoint,
    pub unweighted: FixedPoint,
}

impl HealthMetrics {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: HealthKind) -> FixedPoint {
        match kind {
            HealthKind::Initial => self.initial,
            HealthKind::Maintenance => self.maintenance,
            HealthKind::Unweighted => self.unweighted,
        }
    }

    fn set(&mut self, kind: HealthKind, value: FixedPoint) {
        match kind {
            HealthKind::Initial => self.initial = value,
            HealthKind::Maintenance => self.maintenance = value,
            HealthKind::Unweighted => self.unweighted = value,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            initial: self.initial + other.initial,
            maintenance: self.maintenance + other.maintenance,
            unweighted: self.unweighted + other.unweighted,
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            initial: self.initial - other.initial,
            maintenance: self.maintenance - other.maintenance,
            unweighted: self.unweighted - other.unweighted,
        }
    }
}

// 6.2: weight selection by direction and regime.
pub fn health_weight(balance: &Balance, kind: HealthKind) -> FixedPoint {
    let long = !balance.amount.is_negative();
    match kind {
        HealthKind::Initial => {
            if long {
                balance.weights.long_initial
            } else {
                balance.weights.short_initial
            }
        }
        HealthKind::Maintenance => {
            if long {
                balance.weights.long_maintenance
            } else {
                balance.weights.short_maintenance
            }
        }
        HealthKind::Unweighted => FixedPoint::ONE,
    }
}

/// Weighted value of one balance in one regime, excluding any unsettled
/// quote leg: `amount x oracle_price x weight`.
pub fn balance_weighted_value(balance: &Balance, kind: HealthKind) -> FixedPoint {
    balance.amount * balance.oracle_price * health_weight(balance, kind)
}

/// Health contribution of one balance in one regime. The unsettled quote leg
/// is quote currency and enters at weight 1 in every regime.
pub fn balance_health_contribution(balance: &Balance, kind: HealthKind) -> FixedPoint {
    balance_weighted_value(balance, kind) + balance.v_quote_balance
}

/// Margin a position commits in one regime: `notional x |1 - weight|`, with
/// the weight picked by position direction.
pub fn position_margin(balance: &Balance, kind: HealthKind) -> FixedPoint {
    let notional = (balance.amount * balance.oracle_price).abs();
    notional * (FixedPoint::ONE - health_weight(balance, kind)).abs()
}

/// All three regimes for one balance.
pub fn balance_health(balance: &Balance) -> HealthMetrics {
    let mut metrics = HealthMetrics::zero();
    for kind in HEALTH_KINDS {
        metrics.set(kind, balance_health_contribution(balance, kind));
    }
    metrics
}

// 6.3: account-level aggregation. positive contributions pile into assets,
// negative ones (as magnitudes) into liabilities; health is the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountHealth {
    pub assets: HealthMetrics,
    pub liabilities: HealthMetrics,
}

impl AccountHealth {
    pub fn health(&self) -> HealthMetrics {
        self.assets.sub(&self.liabilities)
    }

    /// Negative maintenance health marks the account liquidatable. The
    /// engine only reports this; acting on it is someone else's job.
    pub fn is_liquidatable(&self) -> bool {
        self.health().maintenance.is_negative()
    }
}

pub fn aggregate_health(balances: &[Balance]) -> AccountHealth {
    let mut aggregate = AccountHealth::default();
    for balance in balances {
        for kind in HEALTH_KINDS {
            let contribution = balance_health_contribution(balance, kind);
            if contribution.is_negative() {
                aggregate
                    .liabilities
                    .set(kind, aggregate.liabilities.get(kind) + contribution.abs());
            } else {
                aggregate
                    .assets
                    .set(kind, aggregate.assets.get(kind) + contribution);
            }
        }
    }
    aggregate
}
