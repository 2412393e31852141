//! Forecast providers
//!
//! A provider turns a free-text location into a validated [`ForecastSeries`]
//! plus the city it resolved to. The advisory service only sees the
//! [`ForecastProvider`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::{City, ForecastSeries};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Forecast for one location as returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastReport {
    pub city: City,
    pub series: ForecastSeries,
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch the short-range forecast for a location name
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastReport>;
}
