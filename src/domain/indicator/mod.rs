//! Indicator series types.
//!
//! - `IndicatorPoint`: a single point aligned with one input bar
//! - `IndicatorSeries`: the per-bar output of an oscillator, same length as its input

pub mod rsi;

use chrono::NaiveDate;
use std::fmt;

/// Default RSI lookback.
pub const DEFAULT_RSI_WINDOW: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid(date: NaiveDate) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value: 0.0,
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub window: usize,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at the most recent bar, if one is defined.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().and_then(IndicatorPoint::get)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }
}

impl fmt::Display for IndicatorSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSI({})", self.window)
    }
}
