#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use tradebuddy::domain::catalog::{AssetCatalog, Category};
use tradebuddy::domain::error::TradeBuddyError;
pub use tradebuddy::domain::ohlcv::OhlcvBar;
use tradebuddy::domain::portfolio::Portfolio;
use tradebuddy::ports::market_data_port::MarketDataPort;
use tradebuddy::ports::portfolio_port::PortfolioStore;

pub struct MockMarketData {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<usize>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(0),
        }
    }

    pub fn with_bars(mut self, asset: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(asset.to_string(), bars);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_bars(&self, asset: &str, _lookback_days: u32) -> Result<Vec<OhlcvBar>, TradeBuddyError> {
        *self.calls.borrow_mut() += 1;
        if let Some(reason) = self.errors.get(asset) {
            return Err(TradeBuddyError::DataUnavailable {
                asset: asset.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(asset).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub records: RefCell<HashMap<String, Portfolio>>,
}

impl PortfolioStore for MemoryStore {
    fn load(&self, user: &str) -> Result<Option<Portfolio>, TradeBuddyError> {
        Ok(self.records.borrow().get(user).cloned())
    }

    fn save(&self, user: &str, portfolio: &Portfolio) -> Result<(), TradeBuddyError> {
        self.records
            .borrow_mut()
            .insert(user.to_string(), portfolio.clone());
        Ok(())
    }
}

/// Wednesday of ISO week 2024-W07.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 14, 16, 0, 0).unwrap()
}

pub fn make_bar(asset: &str, date: &str, close: f64) -> OhlcvBar {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    OhlcvBar::from_close(asset, date, close)
}

/// One bar per calendar day starting 2024-01-01.
pub fn generate_bars(asset: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar::from_close(asset, start + Duration::days(i as i64), close))
        .collect()
}

/// Strictly falling closes ending at `last`: RSI 0 on every defined bar.
pub fn falling_to(last: f64, len: usize) -> Vec<f64> {
    (0..len).rev().map(|i| last + i as f64).collect()
}

/// Strictly rising closes ending at `last`: RSI 100 on every defined bar.
pub fn rising_to(last: f64, len: usize) -> Vec<f64> {
    (0..len).rev().map(|i| last - i as f64 * 0.5).collect()
}

/// Closes alternating down/up by 1 ending at `last`; RSI 50 for even windows.
pub fn choppy_to(last: f64, len: usize) -> Vec<f64> {
    (0..len)
        .rev()
        .map(|i| if i % 2 == 0 { last } else { last + 1.0 })
        .collect()
}

pub fn single_category(label: &str, assets: &[&str]) -> AssetCatalog {
    AssetCatalog::new(vec![Category {
        label: label.to_string(),
        assets: assets.iter().map(|a| a.to_string()).collect(),
    }])
    .unwrap()
}

pub fn write_csv(dir: &std::path::Path, asset: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{asset}.csv")), content).unwrap();
}
