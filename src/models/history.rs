//! Search history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ForecastInterval;

/// Conditions at the time of a search, taken from the first forecast interval
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResultSnapshot {
    /// Temperature in Celsius
    pub temperature_celsius: f64,
    /// Relative humidity (0-100)
    pub humidity_percent: u8,
    /// Human-readable description of the conditions
    pub description: Option<String>,
    /// Provider icon code
    pub icon: Option<String>,
}

impl From<&ForecastInterval> for ResultSnapshot {
    fn from(interval: &ForecastInterval) -> Self {
        Self {
            temperature_celsius: interval.temperature_celsius,
            humidity_percent: interval.humidity_percent,
            description: interval.description.clone(),
            icon: interval.icon.clone(),
        }
    }
}

/// One entry of the search history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchRecord {
    /// Location as resolved by the forecast provider
    pub location: String,
    /// Conditions at search time
    pub snapshot: ResultSnapshot,
    /// When the search was made
    pub created_at: DateTime<Utc>,
}

impl SearchRecord {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new<S: Into<String>>(location: S, snapshot: ResultSnapshot) -> Self {
        Self {
            location: location.into(),
            snapshot,
            created_at: Utc::now(),
        }
    }
}
