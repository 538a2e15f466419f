//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::cached_market_data::CachedMarketData;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store::JsonFileStore;
use crate::domain::auth::{authenticate, hash_password};
use crate::domain::catalog::{AssetCatalog, catalog_from_config};
use crate::domain::config_validation::{validate_game_config, validate_storage_config};
use crate::domain::engine::{EngineConfig, RebuyPolicy, ScanOutcome};
use crate::domain::error::TradeBuddyError;
use crate::domain::game::GameConfig;
use crate::domain::session::Session;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::portfolio_port::PortfolioStore;

/// Recommendations shown as numbered deals; the rest only with `--verbose`.
pub const DEALS_SHOWN: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "tradebuddy", about = "Paper-trading game with RSI buy/sell tips")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the catalog and act on buy/sell signals
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        user: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
        /// List every recommendation, not just the first deals
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show cash, holdings and trades used this week
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Validate a game configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            user,
            password,
            verbose,
        } => run_scan(&config, &user, password, verbose),
        Command::Portfolio {
            config,
            user,
            password,
        } => run_portfolio(&config, &user, password),
        Command::Validate { config } => run_validate(&config),
        Command::HashPassword => run_hash_password(),
    }
}

fn fail(err: TradeBuddyError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Resolve game settings, falling back to the house rules for missing keys.
pub fn build_game_config(config: &dyn ConfigPort) -> Result<GameConfig, TradeBuddyError> {
    validate_game_config(config)?;
    let defaults = GameConfig::default();

    let rebuy = match config.get_string("game", "rebuy") {
        Some(raw) => {
            RebuyPolicy::parse(&raw).ok_or_else(|| TradeBuddyError::ConfigInvalid {
                section: "game".into(),
                key: "rebuy".into(),
                reason: format!("unknown rebuy policy '{}'", raw.trim()),
            })?
        }
        None => defaults.engine.rebuy,
    };

    let engine = EngineConfig {
        oversold: config.get_double("game", "oversold", defaults.engine.oversold),
        overbought: config.get_double("game", "overbought", defaults.engine.overbought),
        min_cash: config.get_double("game", "min_cash", defaults.engine.min_cash),
        weekly_trade_cap: config.get_int(
            "game",
            "weekly_trade_cap",
            defaults.engine.weekly_trade_cap as i64,
        ) as usize,
        max_hold_days: config.get_int("game", "max_hold_days", defaults.engine.max_hold_days),
        rebuy,
    };

    Ok(GameConfig {
        starting_cash: config.get_double("game", "starting_cash", defaults.starting_cash),
        rsi_window: config.get_int("game", "rsi_window", defaults.rsi_window as i64) as usize,
        lookback_days: config.get_int("game", "lookback_days", i64::from(defaults.lookback_days))
            as u32,
        cache_ttl: Duration::from_secs(
            config
                .get_int("data", "cache_ttl_secs", defaults.cache_ttl.as_secs() as i64)
                .max(0) as u64,
        ),
        engine,
    })
}

fn setting(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> String {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Market data source from `[data] source`, wrapped in the TTL cache.
///
/// The cache lives as long as the returned port. A one-shot command fetches
/// each asset once anyway; hosts that keep a [`Game`] around share it across
/// users and scans.
pub fn build_market_data(
    config: &dyn ConfigPort,
    game: &GameConfig,
) -> Result<Box<dyn MarketDataPort>, TradeBuddyError> {
    match setting(config, "data", "source", "csv").to_lowercase().as_str() {
        "csv" => {
            let dir = PathBuf::from(setting(config, "data", "csv_dir", "data"));
            Ok(Box::new(CachedMarketData::new(CsvAdapter::new(dir), game.cache_ttl)))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            let adapter = SqliteAdapter::from_config(config)?;
            Ok(Box::new(CachedMarketData::new(adapter, game.cache_ttl)))
        }
        other => Err(TradeBuddyError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unsupported data source '{other}'"),
        }),
    }
}

/// Portfolio store from `[store] kind`.
pub fn build_store(config: &dyn ConfigPort) -> Result<Box<dyn PortfolioStore>, TradeBuddyError> {
    match setting(config, "store", "kind", "json").to_lowercase().as_str() {
        "json" => Ok(Box::new(JsonFileStore::new(setting(
            config,
            "store",
            "dir",
            "portfolios",
        )))),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        other => Err(TradeBuddyError::ConfigInvalid {
            section: "store".into(),
            key: "kind".into(),
            reason: format!("unsupported store kind '{other}'"),
        }),
    }
}

/// Everything a command needs once the config has been read. One `Game`
/// can serve any number of users; they share its market data cache.
pub struct Game {
    pub settings: GameConfig,
    pub catalog: AssetCatalog,
    pub market: Box<dyn MarketDataPort>,
    pub store: Box<dyn PortfolioStore>,
}

impl Game {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradeBuddyError> {
        let settings = build_game_config(config)?;
        validate_storage_config(config)?;
        let catalog = catalog_from_config(config)?;
        let market = build_market_data(config, &settings)?;
        let store = build_store(config)?;
        Ok(Game {
            settings,
            catalog,
            market,
            store,
        })
    }

    /// Open `user`'s session, run one scan and persist the result.
    pub fn scan(&self, user: &str, now: DateTime<Utc>) -> Result<(Session, ScanOutcome), TradeBuddyError> {
        let mut session = Session::open(self.store.as_ref(), user, now, &self.settings)?;
        let outcome = session.scan(self.market.as_ref(), &self.catalog, &self.settings);
        session.save(self.store.as_ref())?;
        Ok((session, outcome))
    }

    /// Current standing of `user`, valued at the latest closes.
    pub fn portfolio_view(&self, user: &str, now: DateTime<Utc>) -> Result<PortfolioView, TradeBuddyError> {
        let session = Session::open(self.store.as_ref(), user, now, &self.settings)?;
        session.save(self.store.as_ref())?;
        let prices = session.latest_prices(self.market.as_ref(), self.settings.lookback_days);

        let holdings = session
            .portfolio
            .holdings
            .iter()
            .map(|(asset, h)| {
                let price = prices.get(asset).copied();
                HoldingRow {
                    asset: asset.clone(),
                    shares: h.shares,
                    entry_price: h.entry_price,
                    price,
                    value: price.map(|p| h.market_value(p)),
                    pnl: price.map(|p| h.unrealized_pnl(p)),
                    days_held: h.days_held(now),
                }
            })
            .collect();

        Ok(PortfolioView {
            user: session.user.clone(),
            week: session.week.to_string(),
            starting_cash: self.settings.starting_cash,
            cash: session.portfolio.cash,
            total_value: session.portfolio.total_value(&prices),
            trades_used: session.trades_used(),
            trade_cap: self.settings.engine.weekly_trade_cap,
            holdings,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRow {
    pub asset: String,
    pub shares: u64,
    pub entry_price: f64,
    /// `None` when no usable close is available right now.
    pub price: Option<f64>,
    pub value: Option<f64>,
    pub pnl: Option<f64>,
    pub days_held: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub user: String,
    pub week: String,
    pub starting_cash: f64,
    pub cash: f64,
    /// Holdings without a current price are left out.
    pub total_value: f64,
    pub trades_used: usize,
    pub trade_cap: usize,
    pub holdings: Vec<HoldingRow>,
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"))
}

pub fn render_recommendations(outcome: &ScanOutcome, verbose: bool) -> String {
    let mut out = String::new();
    if outcome.recommendations.is_empty() {
        out.push_str("No deals today. Check back tomorrow!\n");
        return out;
    }

    let _ = writeln!(out, "Found {} deals!", outcome.recommendations.len());
    let shown = if verbose {
        outcome.recommendations.len()
    } else {
        DEALS_SHOWN
    };
    for (i, rec) in outcome.recommendations.iter().take(shown).enumerate() {
        let _ = writeln!(out, "\nDeal {}: {} {} ({})", i + 1, rec.side, rec.asset, rec.category);
        let _ = writeln!(
            out,
            "  Amount: {}  Price: ${:.2}  Total: ${:.2}",
            rec.shares, rec.price, rec.total
        );
        let _ = writeln!(out, "  Why? {}", rec.rationale);
    }
    let hidden = outcome.recommendations.len().saturating_sub(shown);
    if hidden > 0 {
        let _ = writeln!(out, "\n(+{hidden} more, use --verbose)");
    }
    out
}

pub fn render_portfolio(view: &PortfolioView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}'s Fun Fund | Week {}", view.user, view.week);
    let _ = writeln!(out, "Starting Cash: ${:.2}", view.starting_cash);
    let _ = writeln!(out, "Current Cash:  ${:.2}", view.cash);
    let _ = writeln!(out, "Total Value:   ${:.2}", view.total_value);
    let _ = writeln!(out, "Trades Used:   {}/{}", view.trades_used, view.trade_cap);

    if view.holdings.is_empty() {
        out.push_str("\nHoldings: empty, scan for buys!\n");
        return out;
    }

    let _ = writeln!(
        out,
        "\n{:<10} {:>7} {:>11} {:>11} {:>11} {:>11} {:>5}",
        "Asset", "Shares", "Bought @", "Now @", "Value", "Gain/Loss", "Days"
    );
    for row in &view.holdings {
        let _ = writeln!(
            out,
            "{:<10} {:>7} {:>11} {:>11} {:>11} {:>11} {:>5}",
            row.asset,
            row.shares,
            format!("${:.2}", row.entry_price),
            money(row.price),
            money(row.value),
            money(row.pnl),
            row.days_held
        );
    }
    out
}

fn read_password(password: Option<String>) -> Result<String, TradeBuddyError> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprintln!("Password:");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn login(config: &dyn ConfigPort, user: &str, password: Option<String>) -> Result<String, TradeBuddyError> {
    let password = read_password(password)?;
    let user = authenticate(config, user, &password)?;
    eprintln!("Welcome, {user}!");
    Ok(user)
}

fn run_scan(config_path: &Path, user: &str, password: Option<String>, verbose: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = login(&config, user, password).and_then(|user| {
        let game = Game::from_config(&config)?;
        let (session, outcome) = game.scan(&user, Utc::now())?;
        Ok((session, outcome, game.settings.engine.weekly_trade_cap))
    });

    match result {
        Ok((session, outcome, cap)) => {
            for warning in &outcome.warnings {
                eprintln!("warning: {warning}");
            }
            print!("{}", render_recommendations(&outcome, verbose));
            println!(
                "\nCash: ${:.2} | Trades used: {}/{}",
                session.portfolio.cash, outcome.trades_this_week, cap
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_portfolio(config_path: &Path, user: &str, password: Option<String>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = login(&config, user, password).and_then(|user| {
        let game = Game::from_config(&config)?;
        game.portfolio_view(&user, Utc::now())
    });

    match result {
        Ok(view) => {
            print!("{}", render_portfolio(&view));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let game = match build_game_config(&config) {
        Ok(g) => g,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_storage_config(&config) {
        return fail(e);
    }
    let catalog = match catalog_from_config(&config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nGame rules:");
    eprintln!("  starting cash:    ${:.2}", game.starting_cash);
    eprintln!(
        "  buy:              RSI({}) < {} and cash > ${:.2}",
        game.rsi_window, game.engine.oversold, game.engine.min_cash
    );
    eprintln!(
        "  sell:             RSI({}) > {} or held > {} days",
        game.rsi_window, game.engine.overbought, game.engine.max_hold_days
    );
    eprintln!("  weekly trade cap: {}", game.engine.weekly_trade_cap);
    eprintln!("  rebuy policy:     {}", game.engine.rebuy);

    eprintln!("\nCatalog:");
    for category in catalog.categories() {
        eprintln!("  {}: {}", category.label, category.assets.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_hash_password() -> ExitCode {
    eprintln!("Enter password to hash:");
    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        return fail(e.into());
    }
    match hash_password(line.trim_end_matches(['\r', '\n'])) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
