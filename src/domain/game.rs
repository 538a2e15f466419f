//! Game-wide settings resolved from config.

use std::time::Duration;

use super::engine::EngineConfig;
use super::indicator::DEFAULT_RSI_WINDOW;
use super::portfolio::STARTING_CASH;

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub starting_cash: f64,
    pub rsi_window: usize,
    /// Calendar days of history requested per asset.
    pub lookback_days: u32,
    pub cache_ttl: Duration,
    pub engine: EngineConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_cash: STARTING_CASH,
            rsi_window: DEFAULT_RSI_WINDOW,
            lookback_days: 60,
            cache_ttl: Duration::from_secs(3600),
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::RebuyPolicy;

    #[test]
    fn defaults_match_house_rules() {
        let c = GameConfig::default();
        assert!((c.starting_cash - 500.0).abs() < f64::EPSILON);
        assert_eq!(c.rsi_window, 14);
        assert_eq!(c.lookback_days, 60);
        assert_eq!(c.cache_ttl, Duration::from_secs(3600));
        assert!((c.engine.oversold - 30.0).abs() < f64::EPSILON);
        assert!((c.engine.overbought - 70.0).abs() < f64::EPSILON);
        assert!((c.engine.min_cash - 100.0).abs() < f64::EPSILON);
        assert_eq!(c.engine.weekly_trade_cap, 3);
        assert_eq!(c.engine.max_hold_days, 5);
        assert_eq!(c.engine.rebuy, RebuyPolicy::Overwrite);
    }

    #[test]
    fn struct_update_overrides() {
        let c = GameConfig {
            lookback_days: 90,
            ..GameConfig::default()
        };
        assert_eq!(c.lookback_days, 90);
        assert_eq!(c.rsi_window, 14);
    }
}
