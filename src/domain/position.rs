//! Open paper positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One open position. Keyed by asset id in [`Portfolio::holdings`](super::portfolio::Portfolio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
}

impl Holding {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// Whole days elapsed since entry. Negative clock skew counts as zero.
    pub fn days_held(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entry_time).num_days().max(0)
    }
}
