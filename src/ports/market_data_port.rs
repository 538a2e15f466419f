//! Market snapshot port trait.

use crate::domain::error::TradeBuddyError;
use crate::domain::ohlcv::OhlcvBar;

pub trait MarketDataPort {
    /// Daily bars for `asset` covering roughly the last `lookback_days`
    /// calendar days, ascending by date. An empty vec means no data.
    fn fetch_bars(&self, asset: &str, lookback_days: u32) -> Result<Vec<OhlcvBar>, TradeBuddyError>;
}
