//! CSV directory market data adapter.
//!
//! One file per asset, `<base>/<ASSET>.csv`, with a header row and columns
//! `date,open,high,low,close,volume` (`date` as YYYY-MM-DD). The lookback
//! window is measured back from the newest bar in the file.

use crate::domain::error::TradeBuddyError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{Duration, NaiveDate};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset: &str) -> Result<PathBuf, TradeBuddyError> {
        if asset.is_empty() || asset.contains(['/', '\\']) || asset.starts_with('.') {
            return Err(TradeBuddyError::DataUnavailable {
                asset: asset.to_string(),
                reason: "asset id is not a valid file name".into(),
            });
        }
        Ok(self.base_path.join(format!("{}.csv", asset)))
    }
}

fn column<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    asset: &str,
) -> Result<T, TradeBuddyError>
where
    T::Err: std::fmt::Display,
{
    let unavailable = |reason: String| TradeBuddyError::DataUnavailable {
        asset: asset.to_string(),
        reason,
    };
    record
        .get(index)
        .ok_or_else(|| unavailable(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| unavailable(format!("invalid {} value: {}", name, e)))
}

impl MarketDataPort for CsvAdapter {
    fn fetch_bars(&self, asset: &str, lookback_days: u32) -> Result<Vec<OhlcvBar>, TradeBuddyError> {
        let path = self.csv_path(asset)?;
        let content = fs::read_to_string(&path).map_err(|e| TradeBuddyError::DataUnavailable {
            asset: asset.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TradeBuddyError::DataUnavailable {
                asset: asset.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str: String = column(&record, 0, "date", asset)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                TradeBuddyError::DataUnavailable {
                    asset: asset.to_string(),
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                asset: asset.to_string(),
                date,
                open: column(&record, 1, "open", asset)?,
                high: column(&record, 2, "high", asset)?,
                low: column(&record, 3, "low", asset)?,
                close: column(&record, 4, "close", asset)?,
                volume: column(&record, 5, "volume", asset)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if let Some(newest) = bars.last().map(|b| b.date) {
            let cutoff = newest - Duration::days(i64::from(lookback_days));
            bars.retain(|b| b.date > cutoff);
        }

        Ok(bars)
    }
}
