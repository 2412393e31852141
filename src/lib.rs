//! `FarmCast` - weather-driven farming advisories
//!
//! This library fetches short-range forecasts, turns them into plain-language
//! farming advisories and keeps a small history of recent searches.

pub mod advisory;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use advisory::{AdvisoryKind, AdvisorySet, ClassifiedAdvisory, generate_advisories};
pub use config::FarmcastConfig;
pub use error::FarmcastError;
pub use models::{City, ForecastInterval, ForecastSeries, ResultSnapshot, SearchRecord};
pub use service::{AdvisoryReport, AdvisoryService};
pub use storage::Storage;
pub use weather::{ForecastProvider, ForecastReport, OpenWeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FarmcastError>;
