//! Market snapshots for one scan.
//!
//! Fetches every catalog asset through the market data port and annotates each
//! series with RSI. Assets that cannot be used are skipped with a warning
//! instead of failing the scan.

use crate::domain::catalog::AssetCatalog;
use crate::domain::error::TradeBuddyError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::ohlcv::{OhlcvBar, is_ascending};
use crate::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// A price series plus one RSI point per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub asset: String,
    pub bars: Vec<OhlcvBar>,
    pub rsi: IndicatorSeries,
}

impl AnnotatedSeries {
    pub fn new(asset: &str, bars: Vec<OhlcvBar>, window: usize) -> Self {
        let rsi = calculate_rsi(&bars, window);
        Self {
            asset: asset.to_string(),
            bars,
            rsi,
        }
    }

    pub fn latest_bar(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.latest()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars needed before the indicator can be defined at the latest bar.
    pub fn minimum_bars(&self) -> usize {
        self.rsi.window + 1
    }

    pub fn require_history(&self) -> Result<(), TradeBuddyError> {
        if self.bars.len() < self.minimum_bars() {
            return Err(TradeBuddyError::InsufficientData {
                asset: self.asset.clone(),
                bars: self.bars.len(),
                minimum: self.minimum_bars(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Provider failed or returned no bars.
    NoData,
    /// Latest close is zero, negative or not a number.
    InvalidPrice,
    /// Too few bars for a defined indicator at the latest bar.
    InsufficientBars { bars: usize, minimum: usize },
    /// Enough bars, but the indicator is undefined at the latest bar (flat window).
    NoSignal,
}

/// Soft, per-asset problem surfaced to the caller. Never aborts a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanWarning {
    pub asset: String,
    pub reason: SkipReason,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::NoData => write!(f, "{}: no data, try again later", self.asset),
            SkipReason::InvalidPrice => write!(f, "{}: latest price is not usable", self.asset),
            SkipReason::InsufficientBars { bars, minimum } => write!(
                f,
                "{}: only {} bars, {} needed for a signal",
                self.asset, bars, minimum
            ),
            SkipReason::NoSignal => write!(f, "{}: no price movement, no signal", self.asset),
        }
    }
}

pub struct SnapshotSet {
    pub series: HashMap<String, AnnotatedSeries>,
    pub warnings: Vec<ScanWarning>,
}

/// Fetch and annotate every catalog asset. Provider errors and empty series are
/// recorded as `NoData` warnings and the asset is left out of `series`.
pub fn collect_snapshots(
    port: &dyn MarketDataPort,
    catalog: &AssetCatalog,
    lookback_days: u32,
    window: usize,
) -> SnapshotSet {
    let mut series = HashMap::new();
    let mut warnings = Vec::new();

    for (_, asset) in catalog.entries() {
        let mut bars = match port.fetch_bars(asset, lookback_days) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(asset, error = %e, "market data fetch failed, skipping");
                warnings.push(ScanWarning {
                    asset: asset.to_string(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(asset, "no market data returned, skipping");
            warnings.push(ScanWarning {
                asset: asset.to_string(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if !is_ascending(&bars) {
            warn!(asset, "provider returned unordered bars, sorting");
            bars.sort_by_key(|b| b.date);
            bars.dedup_by_key(|b| b.date);
        }

        debug!(asset, bars = bars.len(), "annotated snapshot");
        series.insert(asset.to_string(), AnnotatedSeries::new(asset, bars, window));
    }

    SnapshotSet { series, warnings }
}
