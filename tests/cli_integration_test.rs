//! CLI integration tests for the command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_game_config) and validation failures
//! - Adapter selection from `[data]` and `[store]`
//! - Login against `[users]` hashes
//! - Scan and portfolio commands end to end with real INI files on disk

mod common;

use approx::assert_relative_eq;
use chrono::Duration;
use common::*;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use tradebuddy::adapters::file_config_adapter::FileConfigAdapter;
use tradebuddy::cli::{self, Game};
use tradebuddy::domain::auth::{authenticate, hash_password};
use tradebuddy::domain::engine::RebuyPolicy;
use tradebuddy::domain::error::TradeBuddyError;
use tradebuddy::domain::trade::Side;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[game]
starting_cash = 1000
min_cash = 50
weekly_trade_cap = 2
oversold = 25
overbought = 75
max_hold_days = 7
rsi_window = 10
lookback_days = 90
rebuy = skip

[data]
source = csv
csv_dir = ./data
cache_ttl_secs = 600

[store]
kind = json
dir = ./portfolios
"#;

/// Config pointing at temp data/store dirs with a single fruit category.
fn game_ini(data: &Path, store: &Path) -> String {
    format!(
        "[data]\nsource = csv\ncsv_dir = {}\n\n[store]\nkind = json\ndir = {}\n\n\
         [catalog]\ncategories = fruits, veggies\n\n\
         [category.fruits]\nlabel = Fruits (Stocks)\nassets = AAPL\n\n\
         [category.veggies]\nlabel = Veggies (Bonds)\nassets = TLT\n",
        data.display(),
        store.display()
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn build_game_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let game = cli::build_game_config(&adapter).unwrap();

        assert_relative_eq!(game.starting_cash, 1000.0);
        assert_eq!(game.rsi_window, 10);
        assert_eq!(game.lookback_days, 90);
        assert_eq!(game.cache_ttl, std::time::Duration::from_secs(600));
        assert_relative_eq!(game.engine.min_cash, 50.0);
        assert_relative_eq!(game.engine.oversold, 25.0);
        assert_relative_eq!(game.engine.overbought, 75.0);
        assert_eq!(game.engine.weekly_trade_cap, 2);
        assert_eq!(game.engine.max_hold_days, 7);
        assert_eq!(game.engine.rebuy, RebuyPolicy::Skip);
    }

    #[test]
    fn build_game_config_uses_house_rules() {
        let adapter = FileConfigAdapter::from_string("[data]\nsource = csv\n").unwrap();
        let game = cli::build_game_config(&adapter).unwrap();
        assert_eq!(game, tradebuddy::domain::game::GameConfig::default());
    }

    #[test]
    fn build_game_config_rejects_bad_values() {
        let adapter =
            FileConfigAdapter::from_string("[game]\noversold = 80\noverbought = 70\n").unwrap();
        let err = cli::build_game_config(&adapter).unwrap_err();
        assert!(matches!(err, TradeBuddyError::ConfigInvalid { key, .. } if key == "oversold"));
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert_eq!(cli::build_game_config(&adapter).unwrap().rsi_window, 10);
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(cli::load_config(Path::new("/nonexistent/tradebuddy.ini")).is_err());
    }

    #[test]
    fn unknown_store_kind_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[store]\nkind = redis\n").unwrap();
        let err = cli::build_store(&adapter).err().unwrap();
        assert!(matches!(err, TradeBuddyError::ConfigInvalid { section, .. } if section == "store"));
    }

    #[test]
    fn game_from_config_checks_catalog() {
        let adapter = FileConfigAdapter::from_string(
            "[catalog]\ncategories = fruits\n\n[category.fruits]\nlabel = Fruits\n",
        )
        .unwrap();
        let err = Game::from_config(&adapter).err().unwrap();
        assert!(matches!(err, TradeBuddyError::ConfigMissing { key, .. } if key == "assets"));
    }
}

mod login {
    use super::*;

    #[test]
    fn hashed_password_authenticates() {
        let hash = hash_password("guest123").unwrap();
        let adapter =
            FileConfigAdapter::from_string(&format!("[users]\nguest = {hash}\n")).unwrap();

        assert_eq!(authenticate(&adapter, "Guest", "guest123").unwrap(), "guest");
        assert!(matches!(
            authenticate(&adapter, "guest", "wrong"),
            Err(TradeBuddyError::AuthFailed { .. })
        ));
        assert!(matches!(
            authenticate(&adapter, "nobody", "guest123"),
            Err(TradeBuddyError::AuthFailed { .. })
        ));
    }
}

mod commands {
    use super::*;

    #[test]
    fn scan_then_portfolio_over_files() {
        let data = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        write_csv(data.path(), "AAPL", &generate_bars("AAPL", &falling_to(50.0, 30)));
        write_csv(data.path(), "TLT", &generate_bars("TLT", &rising_to(90.0, 30)));

        let file = write_temp_ini(&game_ini(data.path(), store.path()));
        let config = cli::load_config(file.path()).unwrap();
        let game = Game::from_config(&config).unwrap();

        let (session, outcome) = game.scan("guest", fixed_now()).unwrap();
        assert_eq!(outcome.recommendations.len(), 1);
        assert_eq!(outcome.recommendations[0].side, Side::Buy);
        assert_eq!(outcome.trades_this_week, 1);
        assert_relative_eq!(session.portfolio.cash, 0.0);
        assert!(store.path().join("guest_portfolio.json").exists());

        let rendered = cli::render_recommendations(&outcome, false);
        assert!(rendered.contains("Deal 1: BUY AAPL (Fruits (Stocks))"));

        let view = game.portfolio_view("guest", fixed_now() + Duration::days(2)).unwrap();
        assert_eq!(view.trades_used, 1);
        assert_eq!(view.trade_cap, 3);
        assert_relative_eq!(view.total_value, 500.0);
        assert_eq!(view.holdings.len(), 1);
        let row = &view.holdings[0];
        assert_eq!(row.asset, "AAPL");
        assert_eq!(row.days_held, 2);
        assert_relative_eq!(row.pnl.unwrap(), 0.0);

        let text = cli::render_portfolio(&view);
        assert!(text.contains("Trades Used:   1/3"));
        assert!(text.contains("AAPL"));
    }

    #[test]
    fn one_game_shares_market_data_across_users() {
        let data = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        write_csv(data.path(), "AAPL", &generate_bars("AAPL", &falling_to(50.0, 30)));
        write_csv(data.path(), "TLT", &generate_bars("TLT", &rising_to(90.0, 30)));

        let file = write_temp_ini(&game_ini(data.path(), store.path()));
        let config = cli::load_config(file.path()).unwrap();
        let game = Game::from_config(&config).unwrap();

        let (_, first) = game.scan("guest", fixed_now()).unwrap();
        assert_eq!(first.recommendations.len(), 1);

        std::fs::remove_file(data.path().join("AAPL.csv")).unwrap();
        std::fs::remove_file(data.path().join("TLT.csv")).unwrap();

        let (_, second) = game.scan("friend", fixed_now()).unwrap();
        assert_eq!(second.recommendations.len(), 1);
        assert_eq!(second.recommendations[0].asset, "AAPL");
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn portfolio_view_creates_fresh_portfolio() {
        let data = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let file = write_temp_ini(&game_ini(data.path(), store.path()));
        let config = cli::load_config(file.path()).unwrap();
        let game = Game::from_config(&config).unwrap();

        let view = game.portfolio_view("newbie", fixed_now()).unwrap();
        assert_relative_eq!(view.cash, 500.0);
        assert_relative_eq!(view.total_value, 500.0);
        assert!(view.holdings.is_empty());
        assert!(store.path().join("newbie_portfolio.json").exists());
    }

    #[test]
    fn corrupt_portfolio_file_fails_the_command() {
        let data = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        std::fs::write(store.path().join("guest_portfolio.json"), "not json").unwrap();
        let file = write_temp_ini(&game_ini(data.path(), store.path()));
        let config = cli::load_config(file.path()).unwrap();
        let game = Game::from_config(&config).unwrap();

        let err = game.scan("guest", fixed_now()).err().unwrap();
        assert!(matches!(err, TradeBuddyError::MalformedPortfolio { .. }));
        let code: std::process::ExitCode = (&err).into();
        assert_eq!(format!("{code:?}"), format!("{:?}", std::process::ExitCode::from(6)));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_store_selected_from_config() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("game.db");
        let ini = format!(
            "[data]\ncsv_dir = {}\n\n[store]\nkind = sqlite\n\n[sqlite]\npath = {}\n",
            dir.path().display(),
            db.display()
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();
        let game = Game::from_config(&config).unwrap();

        let (_, outcome) = game.scan("guest", fixed_now()).unwrap();
        assert!(outcome.recommendations.is_empty());
        assert_eq!(outcome.warnings.len(), 3);
        assert!(db.exists());
    }
}
