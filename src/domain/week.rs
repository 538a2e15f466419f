//! Trading-week identity for the weekly trade cap.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ISO-8601 week: week number plus the ISO week-based year it belongs to.
///
/// Late-December days can fall in week 1 of the following ISO year (and early
/// January days in week 52/53 of the previous one); `year` follows the ISO
/// calendar so a single trading week never splits across two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> Self {
        WeekKey { year, week }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

pub fn current_week_key(now: DateTime<Utc>) -> WeekKey {
    let iso = now.iso_week();
    WeekKey {
        year: iso.year(),
        week: iso.week(),
    }
}
