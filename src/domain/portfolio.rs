//! Per-user paper portfolio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::error::TradeBuddyError;
use super::position::Holding;
use super::trade::Trade;
use super::week::WeekKey;

/// Fake cash every new account starts with.
pub const STARTING_CASH: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub holdings: BTreeMap<String, Holding>,
    /// Trades counted against the current week.
    pub trades: Vec<Trade>,
    /// Trades from earlier weeks, moved out by [`Portfolio::roll_week`].
    #[serde(default)]
    pub archived_trades: Vec<Trade>,
    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(starting_cash: f64, created_at: DateTime<Utc>) -> Self {
        Portfolio {
            cash: starting_cash,
            holdings: BTreeMap::new(),
            trades: Vec::new(),
            archived_trades: Vec::new(),
            created_at,
        }
    }

    /// Insert or replace the holding for `asset`, returning any replaced record.
    pub fn add_holding(&mut self, asset: &str, holding: Holding) -> Option<Holding> {
        self.holdings.insert(asset.to_string(), holding)
    }

    pub fn get_holding(&self, asset: &str) -> Option<&Holding> {
        self.holdings.get(asset)
    }

    pub fn has_holding(&self, asset: &str) -> bool {
        self.holdings.contains_key(asset)
    }

    pub fn remove_holding(&mut self, asset: &str) -> Option<Holding> {
        self.holdings.remove(asset)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades_in_week(&self, week: WeekKey) -> usize {
        self.trades.iter().filter(|t| t.week == week).count()
    }

    /// Move every active trade not tagged with `week` into the archive.
    /// Returns how many were moved.
    pub fn roll_week(&mut self, week: WeekKey) -> usize {
        let (current, stale): (Vec<Trade>, Vec<Trade>) =
            self.trades.drain(..).partition(|t| t.week == week);
        let moved = stale.len();
        self.archived_trades.extend(stale);
        self.trades = current;
        moved
    }

    /// Cash plus holdings marked at `price_map`. Holdings without a price are left out.
    pub fn total_value(&self, price_map: &HashMap<String, f64>) -> f64 {
        let holdings_value: f64 = self
            .holdings
            .iter()
            .filter_map(|(asset, h)| price_map.get(asset).map(|&p| h.market_value(p)))
            .sum();
        self.cash + holdings_value
    }

    /// Check the invariants a loaded portfolio must satisfy before the engine touches it.
    pub fn validate(&self, user: &str) -> Result<(), TradeBuddyError> {
        let malformed = |reason: String| TradeBuddyError::MalformedPortfolio {
            user: user.to_string(),
            reason,
        };

        if !self.cash.is_finite() || self.cash < 0.0 {
            return Err(malformed(format!("cash must be a non-negative number, got {}", self.cash)));
        }
        for (asset, holding) in &self.holdings {
            if asset.trim().is_empty() {
                return Err(malformed("holding with empty asset id".to_string()));
            }
            if holding.shares == 0 {
                return Err(malformed(format!("holding {asset} has zero shares")));
            }
            if !holding.entry_price.is_finite() || holding.entry_price <= 0.0 {
                return Err(malformed(format!(
                    "holding {asset} has invalid entry price {}",
                    holding.entry_price
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Side;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample_holding(shares: u64) -> Holding {
        Holding {
            shares,
            entry_price: 100.0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(STARTING_CASH, created());
        assert!((portfolio.cash - 500.0).abs() < f64::EPSILON);
        assert!(portfolio.holdings.is_empty());
        assert!(portfolio.trades.is_empty());
        assert!(portfolio.archived_trades.is_empty());
        assert_eq!(portfolio.created_at, created());
    }

    #[test]
    fn add_and_get_holding() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        assert!(portfolio.add_holding("AAPL", sample_holding(3)).is_none());

        assert!(portfolio.has_holding("AAPL"));
        assert_eq!(portfolio.get_holding("AAPL").unwrap().shares, 3);
    }

    #[test]
    fn add_holding_replaces_existing_record() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        portfolio.add_holding("AAPL", sample_holding(3));
        let replaced = portfolio.add_holding("AAPL", sample_holding(7));

        assert_eq!(replaced.unwrap().shares, 3);
        assert_eq!(portfolio.holding_count(), 1);
        assert_eq!(portfolio.get_holding("AAPL").unwrap().shares, 7);
    }

    #[test]
    fn remove_holding() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        portfolio.add_holding("AAPL", sample_holding(3));
        assert!(portfolio.remove_holding("AAPL").is_some());
        assert!(!portfolio.has_holding("AAPL"));
        assert!(portfolio.remove_holding("AAPL").is_none());
    }

    #[test]
    fn trades_in_week_counts_matching_only() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        let this_week = WeekKey::new(2024, 3);
        portfolio.record_trade(Trade::new(Side::Buy, "AAPL", WeekKey::new(2024, 2)));
        portfolio.record_trade(Trade::new(Side::Buy, "TLT", this_week));
        portfolio.record_trade(Trade::new(Side::Sell, "TLT", this_week));

        assert_eq!(portfolio.trades_in_week(this_week), 2);
        assert_eq!(portfolio.trades_in_week(WeekKey::new(2024, 2)), 1);
    }

    #[test]
    fn roll_week_archives_stale_trades() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        let this_week = WeekKey::new(2024, 3);
        portfolio.record_trade(Trade::new(Side::Buy, "AAPL", WeekKey::new(2023, 3)));
        portfolio.record_trade(Trade::new(Side::Buy, "TLT", this_week));
        portfolio.record_trade(Trade::new(Side::Sell, "AAPL", WeekKey::new(2024, 2)));

        let moved = portfolio.roll_week(this_week);

        assert_eq!(moved, 2);
        assert_eq!(portfolio.trades.len(), 1);
        assert_eq!(portfolio.trades[0].asset, "TLT");
        assert_eq!(portfolio.archived_trades.len(), 2);
        assert_eq!(portfolio.roll_week(this_week), 0);
    }

    #[test]
    fn total_value_marks_known_prices() {
        let mut portfolio = Portfolio::new(STARTING_CASH, created());
        portfolio.cash = 200.0;
        portfolio.add_holding("AAPL", sample_holding(2));
        portfolio.add_holding("TLT", sample_holding(1));

        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 150.0);

        assert!((portfolio.total_value(&prices) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_accepts_fresh_portfolio() {
        assert!(Portfolio::new(STARTING_CASH, created()).validate("guest").is_ok());
    }

    #[test]
    fn validate_rejects_bad_state() {
        let mut negative = Portfolio::new(STARTING_CASH, created());
        negative.cash = -1.0;
        assert!(matches!(
            negative.validate("guest"),
            Err(TradeBuddyError::MalformedPortfolio { user, .. }) if user == "guest"
        ));

        let mut nan = Portfolio::new(STARTING_CASH, created());
        nan.cash = f64::NAN;
        assert!(nan.validate("guest").is_err());

        let mut zero_shares = Portfolio::new(STARTING_CASH, created());
        zero_shares.add_holding("AAPL", sample_holding(0));
        assert!(zero_shares.validate("guest").is_err());

        let mut bad_price = Portfolio::new(STARTING_CASH, created());
        let mut h = sample_holding(1);
        h.entry_price = 0.0;
        bad_price.add_holding("AAPL", h);
        assert!(bad_price.validate("guest").is_err());
    }

    #[test]
    fn deserialize_requires_cash() {
        let json = r#"{"holdings":{},"trades":[],"created_at":"2024-01-01T00:00:00Z"}"#;
        let err = serde_json::from_str::<Portfolio>(json).unwrap_err();
        assert!(err.to_string().contains("cash"));
    }

    #[test]
    fn deserialize_defaults_missing_archive() {
        let json = r#"{"cash":12.5,"holdings":{},"trades":[],"created_at":"2024-01-01T00:00:00Z"}"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();
        assert!(portfolio.archived_trades.is_empty());
        assert!((portfolio.cash - 12.5).abs() < f64::EPSILON);
    }
}
