// 8.0 config.rs: engine settings. the margin engine has exactly one knob
// today: which product is the primary quote asset.

use crate::types::ProductId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginConfig {
    /// The primary quote asset. Carries no directional risk: excluded from
    /// the account-leverage numerator and never assigned an estimated PnL.
    pub quote_product_id: ProductId,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            quote_product_id: ProductId(0),
        }
    }
}
