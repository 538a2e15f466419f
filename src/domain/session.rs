//! Per-user play session.
//!
//! A session owns the user's portfolio for one request: it is loaded (or
//! created) once, the week rollover is applied, a scan mutates it in memory,
//! and [`Session::save`] writes it back as a whole. `now` is fixed when the
//! session opens.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::catalog::AssetCatalog;
use super::engine::{ScanOutcome, run_scan};
use super::error::TradeBuddyError;
use super::game::GameConfig;
use super::portfolio::Portfolio;
use super::snapshot::collect_snapshots;
use super::week::{WeekKey, current_week_key};
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::portfolio_port::PortfolioStore;

/// Load `user`'s portfolio, or create and persist a fresh one with `starting_cash`.
/// A loaded portfolio that breaks its invariants is `MalformedPortfolio`.
pub fn load_or_create(
    store: &dyn PortfolioStore,
    user: &str,
    starting_cash: f64,
    now: DateTime<Utc>,
) -> Result<Portfolio, TradeBuddyError> {
    match store.load(user)? {
        Some(portfolio) => {
            portfolio.validate(user)?;
            Ok(portfolio)
        }
        None => {
            info!(user, starting_cash, "creating new portfolio");
            let portfolio = Portfolio::new(starting_cash, now);
            store.save(user, &portfolio)?;
            Ok(portfolio)
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub user: String,
    pub now: DateTime<Utc>,
    pub week: WeekKey,
    pub portfolio: Portfolio,
}

impl Session {
    pub fn open(
        store: &dyn PortfolioStore,
        user: &str,
        now: DateTime<Utc>,
        game: &GameConfig,
    ) -> Result<Self, TradeBuddyError> {
        let mut portfolio = load_or_create(store, user, game.starting_cash, now)?;
        let week = current_week_key(now);
        let archived = portfolio.roll_week(week);
        if archived > 0 {
            debug!(user, archived, %week, "archived trades from earlier weeks");
        }
        Ok(Session {
            user: user.to_string(),
            now,
            week,
            portfolio,
        })
    }

    pub fn trades_used(&self) -> usize {
        self.portfolio.trades_in_week(self.week)
    }

    /// Fetch snapshots for the whole catalog and run one engine pass.
    /// Does not persist; call [`Session::save`] afterwards.
    pub fn scan(
        &mut self,
        market: &dyn MarketDataPort,
        catalog: &AssetCatalog,
        game: &GameConfig,
    ) -> ScanOutcome {
        let snapshots = collect_snapshots(market, catalog, game.lookback_days, game.rsi_window);
        let mut outcome = run_scan(
            &mut self.portfolio,
            catalog,
            &snapshots.series,
            self.week,
            self.now,
            &game.engine,
        );

        for warning in snapshots.warnings {
            if !outcome.warnings.contains(&warning) {
                outcome.warnings.push(warning);
            }
        }

        info!(
            user = %self.user,
            recommendations = outcome.recommendations.len(),
            trades_this_week = outcome.trades_this_week,
            "scan complete"
        );
        outcome
    }

    /// Latest close per asset, for valuing holdings.
    pub fn latest_prices(
        &self,
        market: &dyn MarketDataPort,
        lookback_days: u32,
    ) -> HashMap<String, f64> {
        self.portfolio
            .holdings
            .keys()
            .filter_map(|asset| {
                let bars = market
                    .fetch_bars(asset, lookback_days)
                    .map_err(|e| {
                        warn!(asset = %asset, error = %e, "price lookup failed, holding unvalued")
                    })
                    .ok()?;
                let last = bars.last().filter(|b| b.has_tradable_close())?;
                Some((asset.clone(), last.close))
            })
            .collect()
    }

    pub fn save(&self, store: &dyn PortfolioStore) -> Result<(), TradeBuddyError> {
        store.save(&self.user, &self.portfolio)
    }
}
