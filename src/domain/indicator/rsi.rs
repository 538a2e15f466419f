//! RSI (Relative Strength Index), simple-moving-average variant.
//!
//! Average gain/loss at bar `i` is the plain mean of the `window` price changes
//! ending at `i` (no Wilder smoothing carry-over).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - avg_loss == 0, avg_gain > 0: RSI = 100
//! - avg_loss == 0, avg_gain == 0: undefined (flat window, no signal)
//!
//! Warmup: bars `0..window` are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    if window == 0 || bars.len() <= window {
        return IndicatorSeries {
            window,
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i < window {
            values.push(IndicatorPoint::invalid(bar.date));
            continue;
        }

        // change index j describes bar j+1, so bar i covers changes (i-window)..i
        let start = i - window;
        let avg_gain = gains[start..i].iter().sum::<f64>() / window as f64;
        let avg_loss = losses[start..i].iter().sum::<f64>() / window as f64;

        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: rsi,
            }),
            None => values.push(IndicatorPoint::invalid(bar.date)),
        }
    }

    IndicatorSeries { window, values }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    Some(rsi.clamp(0.0, 100.0))
}
