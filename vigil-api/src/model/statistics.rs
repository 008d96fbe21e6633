//! Aggregate snapshot from `/events/user/{user_id}/statistics`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default statistics window in days
pub const DEFAULT_STATISTICS_DAYS: u32 = 7;

/// Largest window the backend accepts
pub const MAX_STATISTICS_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Event counts over the last N days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStatistics {
    pub total_events: u64,
    /// Count per event type wire name
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
    /// Count per `YYYY-MM-DD` day
    #[serde(default)]
    pub by_day: BTreeMap<String, u64>,
    #[serde(default)]
    pub average_confidence: f64,
    pub date_range: DateRange,
}

impl EventStatistics {
    /// The day with the most events, earliest day on ties
    pub fn busiest_day(&self) -> Option<(&str, u64)> {
        self.by_day
            .iter()
            .fold(None, |best: Option<(&str, u64)>, (day, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((day.as_str(), *count)),
            })
    }
}
