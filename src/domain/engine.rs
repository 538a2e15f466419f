//! Recommendation engine.
//!
//! One scan walks the catalog in order. Each asset goes through two steps
//! against the latest bar:
//!
//! 1. buy check: RSI oversold, enough cash, weekly cap not reached
//! 2. sell check: open holding, weekly cap not reached, and RSI overbought or
//!    the holding is older than `max_hold_days`
//!
//! Step 2 reads the holdings as left by step 1. The weekly trade count is shared
//! by every asset in the pass, so reaching the cap early suppresses both buys and
//! sells for the rest of the catalog. The engine never reads the clock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use super::catalog::AssetCatalog;
use super::error::TradeBuddyError;
use super::portfolio::Portfolio;
use super::position::Holding;
use super::snapshot::{AnnotatedSeries, ScanWarning, SkipReason};
use super::trade::{Side, Trade};
use super::week::WeekKey;

/// What a buy signal does when the asset is already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuyPolicy {
    /// Replace the open holding with the new fill. The replaced shares are dropped
    /// from the portfolio without being credited back.
    Overwrite,
    /// Ignore buy signals while a holding is open.
    Skip,
}

impl RebuyPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "overwrite" => Some(RebuyPolicy::Overwrite),
            "skip" => Some(RebuyPolicy::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for RebuyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuyPolicy::Overwrite => write!(f, "overwrite"),
            RebuyPolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Buy when RSI is strictly below this.
    pub oversold: f64,
    /// Sell when RSI is strictly above this.
    pub overbought: f64,
    /// Buy only while cash is strictly above this.
    pub min_cash: f64,
    /// Max executed trades (buys and sells together) per ISO week.
    pub weekly_trade_cap: usize,
    /// Sell once a holding is older than this many whole days.
    pub max_hold_days: i64,
    pub rebuy: RebuyPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            oversold: 30.0,
            overbought: 70.0,
            min_cash: 100.0,
            weekly_trade_cap: 3,
            max_hold_days: 5,
            rebuy: RebuyPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub asset: String,
    pub category: String,
    pub side: Side,
    pub shares: u64,
    pub price: f64,
    /// shares * price
    pub total: f64,
    pub rationale: String,
    /// Realized profit on a sell. Reported only, never stored.
    pub realized_pnl: Option<f64>,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ ${:.2} = ${:.2} ({})",
            self.side, self.shares, self.asset, self.price, self.total, self.category
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<ScanWarning>,
    /// Trades counted against `week` after the scan.
    pub trades_this_week: usize,
}

pub fn run_scan(
    portfolio: &mut Portfolio,
    catalog: &AssetCatalog,
    snapshots: &HashMap<String, AnnotatedSeries>,
    week: WeekKey,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> ScanOutcome {
    let mut trades_this_week = portfolio.trades_in_week(week);
    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();

    for (category, asset) in catalog.entries() {
        let Some(series) = snapshots.get(asset).filter(|s| !s.is_empty()) else {
            warn!(asset, "no snapshot, skipping");
            warnings.push(ScanWarning {
                asset: asset.to_string(),
                reason: SkipReason::NoData,
            });
            continue;
        };
        let Some(bar) = series.latest_bar().filter(|b| b.has_tradable_close()) else {
            warn!(asset, "latest close not tradable, skipping");
            warnings.push(ScanWarning {
                asset: asset.to_string(),
                reason: SkipReason::InvalidPrice,
            });
            continue;
        };
        let price = bar.close;
        let rsi = series.latest_rsi();

        if rsi.is_none() {
            let reason = match series.require_history() {
                Err(TradeBuddyError::InsufficientData { bars, minimum, .. }) => {
                    SkipReason::InsufficientBars { bars, minimum }
                }
                _ => SkipReason::NoSignal,
            };
            debug!(asset, ?reason, "indicator undefined at latest bar");
            warnings.push(ScanWarning {
                asset: asset.to_string(),
                reason,
            });
        }

        let ctx = Evaluation {
            asset,
            category,
            price,
            rsi,
            week,
            now,
        };

        if trades_this_week < config.weekly_trade_cap {
            if let Some(rec) = try_buy(portfolio, &ctx, config) {
                trades_this_week += 1;
                recommendations.push(rec);
            }
        }

        if trades_this_week < config.weekly_trade_cap {
            if let Some(rec) = try_sell(portfolio, &ctx, config) {
                trades_this_week += 1;
                recommendations.push(rec);
            }
        }
    }

    ScanOutcome {
        recommendations,
        warnings,
        trades_this_week,
    }
}

struct Evaluation<'a> {
    asset: &'a str,
    category: &'a str,
    price: f64,
    rsi: Option<f64>,
    week: WeekKey,
    now: DateTime<Utc>,
}

fn try_buy(portfolio: &mut Portfolio, ctx: &Evaluation<'_>, config: &EngineConfig) -> Option<Recommendation> {
    let rsi = ctx.rsi.filter(|&r| r < config.oversold)?;
    if portfolio.cash <= config.min_cash {
        return None;
    }
    if config.rebuy == RebuyPolicy::Skip && portfolio.has_holding(ctx.asset) {
        debug!(asset = ctx.asset, "already held, rebuy skipped");
        return None;
    }

    let shares = affordable_shares(portfolio.cash, ctx.price);
    if shares == 0 {
        return None;
    }
    let cost = shares as f64 * ctx.price;
    portfolio.cash -= cost;

    let replaced = portfolio.add_holding(
        ctx.asset,
        Holding {
            shares,
            entry_price: ctx.price,
            entry_time: ctx.now,
        },
    );
    if let Some(old) = replaced {
        warn!(
            asset = ctx.asset,
            dropped_shares = old.shares,
            "buy overwrote an open holding"
        );
    }
    portfolio.record_trade(Trade::new(Side::Buy, ctx.asset, ctx.week));
    info!(asset = ctx.asset, shares, price = ctx.price, rsi, "BUY");

    Some(Recommendation {
        asset: ctx.asset.to_string(),
        category: ctx.category.to_string(),
        side: Side::Buy,
        shares,
        price: ctx.price,
        total: cost,
        rationale: format!(
            "Price dipped like a sale! Grab {shares} now for a quick bounce. \
             Sell when up 5-10% (few days)."
        ),
        realized_pnl: None,
    })
}

fn try_sell(portfolio: &mut Portfolio, ctx: &Evaluation<'_>, config: &EngineConfig) -> Option<Recommendation> {
    // No indicator, no sell signal of either kind.
    let rsi = ctx.rsi?;
    let holding = portfolio.get_holding(ctx.asset)?;
    let overbought = rsi > config.overbought;
    let days_held = holding.days_held(ctx.now);
    let held_too_long = days_held > config.max_hold_days;
    if !overbought && !held_too_long {
        return None;
    }

    let holding = portfolio.remove_holding(ctx.asset)?;
    let proceeds = holding.market_value(ctx.price);
    let pnl = holding.unrealized_pnl(ctx.price);
    portfolio.cash += proceeds;
    portfolio.record_trade(Trade::new(Side::Sell, ctx.asset, ctx.week));
    info!(asset = ctx.asset, shares = holding.shares, price = ctx.price, pnl, "SELL");

    let why = if overbought {
        "Price peaked".to_string()
    } else {
        format!("Held {days_held} days, that's long enough")
    };

    Some(Recommendation {
        asset: ctx.asset.to_string(),
        category: ctx.category.to_string(),
        side: Side::Sell,
        shares: holding.shares,
        price: ctx.price,
        total: proceeds,
        rationale: format!("{why}. Cash out for ${pnl:.2} gain/loss!"),
        realized_pnl: Some(pnl),
    })
}

/// Whole shares purchasable without taking cash below zero.
fn affordable_shares(cash: f64, price: f64) -> u64 {
    if !(cash.is_finite() && price.is_finite()) || cash <= 0.0 || price <= 0.0 {
        return 0;
    }
    let mut shares = (cash / price).floor() as u64;
    while shares > 0 && shares as f64 * price > cash {
        shares -= 1;
    }
    shares
}
