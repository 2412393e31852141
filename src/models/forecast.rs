//! Forecast interval and series models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FarmcastError, Result};

/// Conversion factor from m/s to km/h
pub const MS_TO_KMH: f64 = 3.6;

/// One time-stepped forecast reading (typically a 3-hour block)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastInterval {
    /// Start of the interval
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature_celsius: f64,
    /// Relative humidity (0-100)
    pub humidity_percent: u8,
    /// Wind speed in m/s
    pub wind_speed_ms: f64,
    /// Probability of precipitation as a fraction (0.0-1.0)
    pub precipitation_probability: f64,
    /// Provider's description of the conditions
    pub description: Option<String>,
    /// Provider's icon code
    pub icon: Option<String>,
}

impl ForecastInterval {
    /// Create an interval without description or icon
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        temperature_celsius: f64,
        humidity_percent: u8,
        wind_speed_ms: f64,
        precipitation_probability: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature_celsius,
            humidity_percent,
            wind_speed_ms,
            precipitation_probability,
            description: None,
            icon: None,
        }
    }

    /// Wind speed converted to km/h
    #[must_use]
    pub fn wind_speed_kmh(&self) -> f64 {
        self.wind_speed_ms * MS_TO_KMH
    }

    /// Check the value ranges of a single interval
    pub fn validate(&self) -> Result<()> {
        if !self.temperature_celsius.is_finite() {
            return Err(FarmcastError::validation(format!(
                "Temperature at {} is not a finite number",
                self.timestamp
            )));
        }
        if self.humidity_percent > 100 {
            return Err(FarmcastError::validation(format!(
                "Humidity at {} must be between 0 and 100, got: {}",
                self.timestamp, self.humidity_percent
            )));
        }
        if !self.wind_speed_ms.is_finite() || self.wind_speed_ms < 0.0 {
            return Err(FarmcastError::validation(format!(
                "Wind speed at {} must be a non-negative number, got: {}",
                self.timestamp, self.wind_speed_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.precipitation_probability) {
            return Err(FarmcastError::validation(format!(
                "Precipitation probability at {} must be between 0.0 and 1.0, got: {}",
                self.timestamp, self.precipitation_probability
            )));
        }
        Ok(())
    }
}

/// Chronological sequence of forecast intervals
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ForecastSeries(Vec<ForecastInterval>);

impl ForecastSeries {
    /// Build a series, rejecting malformed or out-of-order intervals
    pub fn new(intervals: Vec<ForecastInterval>) -> Result<Self> {
        for interval in &intervals {
            interval.validate()?;
        }

        if let Some(pair) = intervals
            .windows(2)
            .find(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(FarmcastError::validation(format!(
                "Forecast intervals are not chronological: {} follows {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }

        Ok(Self(intervals))
    }

    /// Series with no intervals
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn intervals(&self) -> &[ForecastInterval] {
        &self.0
    }

    /// First interval of the series (the current conditions)
    #[must_use]
    pub fn current(&self) -> Option<&ForecastInterval> {
        self.0.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_intervals(self) -> Vec<ForecastInterval> {
        self.0
    }
}

/// City the provider resolved a location query to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// City name
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
}

impl City {
    /// City known only by name
    #[must_use]
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            country: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Name with the country code appended when known
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn interval_at(hours: i64) -> ForecastInterval {
        let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        ForecastInterval::new(base + Duration::hours(hours), 22.0, 50, 2.0, 0.05)
    }

    #[test]
    fn test_wind_speed_kmh() {
        let mut interval = interval_at(0);
        interval.wind_speed_ms = 5.0;
        assert!((interval.wind_speed_kmh() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_accepts_chronological_intervals() {
        let series =
            ForecastSeries::new(vec![interval_at(0), interval_at(3), interval_at(6)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.current().unwrap().timestamp, interval_at(0).timestamp);
    }

    #[test]
    fn test_series_rejects_out_of_order_intervals() {
        let result = ForecastSeries::new(vec![interval_at(3), interval_at(0)]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("not chronological"));
    }

    #[test]
    fn test_series_rejects_percentage_pop() {
        let mut interval = interval_at(0);
        interval.precipitation_probability = 70.0;
        assert!(ForecastSeries::new(vec![interval]).is_err());
    }

    #[test]
    fn test_series_rejects_humidity_above_100() {
        let mut interval = interval_at(0);
        interval.humidity_percent = 101;
        assert!(matches!(
            ForecastSeries::new(vec![interval]),
            Err(FarmcastError::Validation { .. })
        ));
    }

    #[test]
    fn test_series_rejects_negative_wind() {
        let mut interval = interval_at(0);
        interval.wind_speed_ms = -1.0;
        assert!(ForecastSeries::new(vec![interval]).is_err());
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = ForecastSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.current().is_none());
    }

    #[test]
    fn test_city_display_name() {
        let mut city = City::named("Nakuru");
        assert_eq!(city.display_name(), "Nakuru");
        city.country = Some("KE".to_string());
        assert_eq!(city.display_name(), "Nakuru, KE");
    }
}
