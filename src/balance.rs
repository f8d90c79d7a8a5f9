// 5.0 balance.rs: point-in-time balance records and their valuation.
// a Balance is built once per calculation from a snapshot and never mutated.
// amount >= 0 is a deposit/long, amount < 0 a borrow/short.

use crate::fixed_point::FixedPoint;
use crate::types::{BalanceKind, ProductId};
use serde::{Deserialize, Serialize};

// 5.1: per-product risk weights. long weights sit below 1, short weights
// above 1; the gap to 1 is the haircut each health regime applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWeights {
    pub long_initial: FixedPoint,
    pub long_maintenance: FixedPoint,
    pub short_initial: FixedPoint,
    pub short_maintenance: FixedPoint,
}

impl ProductWeights {
    /// The primary quote asset carries no haircut in any regime.
    pub fn quote() -> Self {
        Self {
            long_initial: FixedPoint::ONE,
            long_maintenance: FixedPoint::ONE,
            short_initial: FixedPoint::ONE,
            short_maintenance: FixedPoint::ONE,
        }
    }
}

// 5.2: one spot or perp balance with everything valuation needs inlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub product_id: ProductId,
    pub kind: BalanceKind,
    pub amount: FixedPoint,
    pub oracle_price: FixedPoint,
    pub weights: ProductWeights,
    /// Unsettled quote leg of a perp position. Zero for spot balances.
    pub v_quote_balance: FixedPoint,
}

impl Balance {
    pub fn spot(
        product_id: ProductId,
        amount: FixedPoint,
        oracle_price: FixedPoint,
        weights: ProductWeights,
    ) -> Self {
        Self {
            product_id,
            kind: BalanceKind::Spot,
            amount,
            oracle_price,
            weights,
            v_quote_balance: FixedPoint::ZERO,
        }
    }

    pub fn perp(
        product_id: ProductId,
        amount: FixedPoint,
        oracle_price: FixedPoint,
        weights: ProductWeights,
        v_quote_balance: FixedPoint,
    ) -> Self {
        Self {
            product_id,
            kind: BalanceKind::Perp,
            amount,
            oracle_price,
            weights,
            v_quote_balance,
        }
    }

    pub fn is_spot(&self) -> bool {
        self.kind == BalanceKind::Spot
    }

    pub fn is_perp(&self) -> bool {
        self.kind == BalanceKind::Perp
    }
}

// 5.3: an isolated perp position with its dedicated quote margin. at most one
// per product per subaccount; margin is denominated in the quote asset only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolatedPosition {
    pub product_id: ProductId,
    pub position_size: FixedPoint,
    pub oracle_price: FixedPoint,
    pub weights: ProductWeights,
    /// Quote margin deposited into the position.
    pub quote_amount: FixedPoint,
    /// Full unsettled value of the base leg: size x price + unsettled quote.
    pub unsettled_pnl: FixedPoint,
}

impl IsolatedPosition {
    /// Reconstruct the implicit perp balance backing this position.
    pub fn base_balance(&self) -> Balance {
        let v_quote = self.unsettled_pnl - spot_value(self.position_size, self.oracle_price);
        Balance::perp(
            self.product_id,
            self.position_size,
            self.oracle_price,
            self.weights,
            v_quote,
        )
    }
}

// 5.4: valuation. pure arithmetic, no failure modes.

/// Quote value of a spot balance, sign preserved.
pub fn spot_value(amount: FixedPoint, oracle_price: FixedPoint) -> FixedPoint {
    amount * oracle_price
}

/// Absolute dollar-equivalent size of a perp position.
pub fn perp_notional(amount: FixedPoint, oracle_price: FixedPoint) -> FixedPoint {
    (amount * oracle_price).abs()
}

/// True quote value of a perp balance including unsettled PnL.
pub fn perp_full_value(
    amount: FixedPoint,
    oracle_price: FixedPoint,
    v_quote_balance: FixedPoint,
) -> FixedPoint {
    amount * oracle_price + v_quote_balance
}
