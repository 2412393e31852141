//! Data models for the FarmCast service
//!
//! This module contains the domain models organized by concern:
//! - Forecast: forecast intervals, series and the resolved city
//! - History: search records and their result snapshots

pub mod forecast;
pub mod history;

// Re-export all public types for convenient access
pub use forecast::{City, ForecastInterval, ForecastSeries, MS_TO_KMH};
pub use history::{ResultSnapshot, SearchRecord};
