//! TTL cache in front of any market data port.
//!
//! Entries are keyed by asset id only, so every user hitting the same asset
//! shares one upstream fetch per TTL window. Failed or empty fetches are not
//! cached.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::error::TradeBuddyError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;

struct CacheEntry {
    bars: Vec<OhlcvBar>,
    lookback_days: u32,
    expires_at: Instant,
}

pub struct CachedMarketData<P> {
    inner: P,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl<P: MarketDataPort> CachedMarketData<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Drop every cached series.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove entries whose TTL has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cached(&self, asset: &str, lookback_days: u32) -> Option<Vec<OhlcvBar>> {
        let entry = self.entries.get(asset)?;
        if entry.expires_at > Instant::now() && entry.lookback_days >= lookback_days {
            Some(entry.bars.clone())
        } else {
            None
        }
    }
}

impl<P: MarketDataPort> MarketDataPort for CachedMarketData<P> {
    fn fetch_bars(&self, asset: &str, lookback_days: u32) -> Result<Vec<OhlcvBar>, TradeBuddyError> {
        if let Some(bars) = self.cached(asset, lookback_days) {
            debug!(asset, "market data cache hit");
            return Ok(bars);
        }

        debug!(asset, "market data cache miss");
        let bars = self.inner.fetch_bars(asset, lookback_days)?;
        if !bars.is_empty() {
            self.entries.insert(
                asset.to_string(),
                CacheEntry {
                    bars: bars.clone(),
                    lookback_days,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
        Ok(bars)
    }
}
