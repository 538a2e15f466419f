//! Executed trade records.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::week::WeekKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Immutable record of one executed action, tagged with the week it counts against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    pub asset: String,
    pub week: WeekKey,
}

impl Trade {
    pub fn new(side: Side, asset: &str, week: WeekKey) -> Self {
        Trade {
            side,
            asset: asset.to_string(),
            week,
        }
    }
}
