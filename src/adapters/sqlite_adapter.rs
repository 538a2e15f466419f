//! SQLite adapter: daily bars and portfolios in one database file.
//!
//! Portfolios are stored whole as a JSON document per user (`portfolios`
//! table), so the schema never changes when the portfolio shape does.

use crate::domain::error::TradeBuddyError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::portfolio::Portfolio;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::portfolio_port::PortfolioStore;
use chrono::{NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> TradeBuddyError {
    TradeBuddyError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradeBuddyError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TradeBuddyError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TradeBuddyError::Database {
                    reason: e.to_string(),
                })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, TradeBuddyError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TradeBuddyError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradeBuddyError> {
        self.pool.get().map_err(|e: r2d2::Error| TradeBuddyError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), TradeBuddyError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    asset TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (asset, date)
                );
                CREATE TABLE IF NOT EXISTS portfolios (
                    user_id TEXT PRIMARY KEY,
                    document TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )
            .map_err(query_err)
    }

    pub fn insert_bars(&self, bars: &[OhlcvBar]) -> Result<(), TradeBuddyError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (asset, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.asset,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }
}

impl MarketDataPort for SqliteAdapter {
    /// Bars within `lookback_days` of the newest stored bar for `asset`.
    fn fetch_bars(&self, asset: &str, lookback_days: u32) -> Result<Vec<OhlcvBar>, TradeBuddyError> {
        let conn = self.conn()?;

        let query = "SELECT asset, date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE asset = ?1
                       AND date > date((SELECT MAX(date) FROM ohlcv WHERE asset = ?1), ?2)
                     ORDER BY date ASC";
        let modifier = format!("-{} days", lookback_days);

        let mut stmt = conn.prepare(query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![asset, modifier], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(OhlcvBar {
                    asset: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_err)?);
        }
        Ok(bars)
    }
}

impl PortfolioStore for SqliteAdapter {
    fn load(&self, user: &str) -> Result<Option<Portfolio>, TradeBuddyError> {
        let conn = self.conn()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM portfolios WHERE user_id = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        match document {
            None => Ok(None),
            Some(doc) => serde_json::from_str(&doc).map(Some).map_err(|e| {
                TradeBuddyError::MalformedPortfolio {
                    user: user.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    fn save(&self, user: &str, portfolio: &Portfolio) -> Result<(), TradeBuddyError> {
        let document = serde_json::to_string(portfolio)?;
        self.conn()?
            .execute(
                "INSERT INTO portfolios (user_id, document, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET document = excluded.document,
                                                    updated_at = excluded.updated_at",
                params![user, document, Utc::now().to_rfc3339()],
            )
            .map_err(query_err)?;
        Ok(())
    }
}
