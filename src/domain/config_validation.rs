//! Configuration validation.
//!
//! Checks every game, data and store setting before a session opens, so a
//! bad config fails up front instead of halfway through a scan.

use crate::domain::catalog::catalog_from_config;
use crate::domain::engine::RebuyPolicy;
use crate::domain::error::TradeBuddyError;
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: &[&str] = &["csv", "sqlite"];
pub const STORE_KINDS: &[&str] = &["json", "sqlite"];

pub fn validate_game_config(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    validate_cash(config)?;
    validate_trade_cap(config)?;
    validate_thresholds(config)?;
    validate_hold_days(config)?;
    validate_window(config)?;
    validate_rebuy(config)?;
    Ok(())
}

pub fn validate_storage_config(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    validate_data_source(config)?;
    validate_store_kind(config)?;
    catalog_from_config(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradeBuddyError {
    TradeBuddyError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present-but-unparsable values are an error; `get_double` would silently
/// fall back to the default.
fn number(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, TradeBuddyError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(section, key, format!("'{}' is not a number", raw.trim()))),
    }
}

fn integer(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<i64, TradeBuddyError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw.trim()))),
    }
}

fn validate_cash(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    if number(config, "game", "starting_cash", 500.0)? <= 0.0 {
        return Err(invalid("game", "starting_cash", "starting_cash must be positive"));
    }
    if number(config, "game", "min_cash", 100.0)? < 0.0 {
        return Err(invalid("game", "min_cash", "min_cash must be non-negative"));
    }
    Ok(())
}

fn validate_trade_cap(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    if integer(config, "game", "weekly_trade_cap", 3)? < 1 {
        return Err(invalid(
            "game",
            "weekly_trade_cap",
            "weekly_trade_cap must be at least 1",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    let oversold = number(config, "game", "oversold", 30.0)?;
    let overbought = number(config, "game", "overbought", 70.0)?;

    if !(0.0..=100.0).contains(&oversold) {
        return Err(invalid("game", "oversold", "oversold must be between 0 and 100"));
    }
    if !(0.0..=100.0).contains(&overbought) {
        return Err(invalid("game", "overbought", "overbought must be between 0 and 100"));
    }
    if oversold >= overbought {
        return Err(invalid("game", "oversold", "oversold must be below overbought"));
    }
    Ok(())
}

fn validate_hold_days(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    if integer(config, "game", "max_hold_days", 5)? < 0 {
        return Err(invalid("game", "max_hold_days", "max_hold_days must be non-negative"));
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    let window = integer(config, "game", "rsi_window", 14)?;
    if window < 1 {
        return Err(invalid("game", "rsi_window", "rsi_window must be at least 1"));
    }
    let lookback = integer(config, "game", "lookback_days", 60)?;
    if lookback <= window || lookback > i64::from(u32::MAX) {
        return Err(invalid(
            "game",
            "lookback_days",
            format!("lookback_days must be greater than rsi_window ({window})"),
        ));
    }
    Ok(())
}

fn validate_rebuy(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    match config.get_string("game", "rebuy") {
        Some(raw) if RebuyPolicy::parse(&raw).is_none() => Err(invalid(
            "game",
            "rebuy",
            format!("unknown rebuy policy '{}', expected overwrite or skip", raw.trim()),
        )),
        _ => Ok(()),
    }
}

fn check_kind(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    allowed: &[&str],
    default: &str,
) -> Result<String, TradeBuddyError> {
    let kind = config
        .get_string(section, key)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| default.to_string());
    if !allowed.contains(&kind.as_str()) {
        return Err(invalid(
            section,
            key,
            format!("'{}' is not one of {}", kind, allowed.join(", ")),
        ));
    }
    if kind == "sqlite" {
        if !cfg!(feature = "sqlite") {
            return Err(invalid(section, key, "built without the sqlite feature"));
        }
        match config.get_string("sqlite", "path") {
            Some(p) if !p.trim().is_empty() => {}
            _ => {
                return Err(TradeBuddyError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
        }
    }
    Ok(kind)
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    check_kind(config, "data", "source", DATA_SOURCES, "csv")?;
    if integer(config, "data", "cache_ttl_secs", 3600)? < 0 {
        return Err(invalid("data", "cache_ttl_secs", "cache_ttl_secs must be non-negative"));
    }
    Ok(())
}

fn validate_store_kind(config: &dyn ConfigPort) -> Result<(), TradeBuddyError> {
    check_kind(config, "store", "kind", STORE_KINDS, "json").map(|_| ())
}
