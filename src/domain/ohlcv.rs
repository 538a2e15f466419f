//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub asset: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Bar where every price equals `close`, as delivered by close-only sources.
    pub fn from_close(asset: &str, date: NaiveDate, close: f64) -> Self {
        OhlcvBar {
            asset: asset.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    /// A close that can be traded against: finite and strictly positive.
    pub fn has_tradable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// True when dates strictly ascend.
pub fn is_ascending(bars: &[OhlcvBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}
