//! OpenWeatherMap forecast client
//!
//! Uses the 5 day / 3 hour forecast endpoint with metric units, so
//! temperatures arrive in Celsius and wind speed in m/s. Transient failures
//! are retried with exponential backoff by the middleware stack.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{ForecastProvider, ForecastReport};
use crate::config::WeatherConfig;
use crate::models::{City, ForecastInterval, ForecastSeries};
use crate::{FarmcastError, Result};

const USER_AGENT: &str = concat!("FarmCast/", env!("CARGO_PKG_VERSION"));

/// OpenWeatherMap API client
pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client; fails when no API key is configured
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                FarmcastError::config(
                    "OpenWeatherMap API key is not configured. Set weather.api_key or OPENWEATHER_API.",
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(250), Duration::from_secs(5))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn forecast_url(&self, location: &str) -> String {
        format!(
            "{}/forecast?q={}&appid={}&units=metric",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastReport> {
        let start_time = Instant::now();
        debug!("Requesting OpenWeatherMap forecast");

        let response = self.client.get(self.forecast_url(location)).send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => {
                warn!("Location not found (HTTP 404)");
                return Err(FarmcastError::location_not_found(location));
            }
            StatusCode::UNAUTHORIZED => {
                warn!("API key rejected (HTTP 401)");
                return Err(FarmcastError::config(
                    "OpenWeatherMap rejected the configured API key",
                ));
            }
            status if !status.is_success() => {
                warn!(%status, "Forecast request failed");
                return Err(FarmcastError::provider(format!(
                    "Forecast request failed with status: {status}"
                )));
            }
            _ => {}
        }

        let body: ForecastResponse = response.json().await.map_err(|e| {
            FarmcastError::provider(format!("Invalid forecast data received: {e}"))
        })?;

        let report = body.into_report(location)?;

        let elapsed = start_time.elapsed();
        info!(
            city = %report.city.name,
            intervals = report.series.len(),
            "Retrieved forecast in {:.3}s",
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow forecast API response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(report)
    }
}

/// Forecast response of the OpenWeatherMap API
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
    city: Option<CityInfo>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    /// Unix timestamp (seconds)
    dt: i64,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Wind,
    /// Probability of precipitation; absent means none
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CityInfo {
    name: String,
    country: Option<String>,
    coord: Option<Coord>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

impl ForecastResponse {
    fn into_report(self, query: &str) -> Result<ForecastReport> {
        let city = match self.city {
            Some(info) if !info.name.is_empty() => City {
                name: info.name,
                country: info.country,
                latitude: info.coord.as_ref().map(|c| c.lat),
                longitude: info.coord.as_ref().map(|c| c.lon),
            },
            _ => City::named(query),
        };

        let intervals = self
            .list
            .into_iter()
            .map(ForecastItem::into_interval)
            .collect::<Result<Vec<_>>>()?;
        let series = ForecastSeries::new(intervals).map_err(invalid_data)?;

        Ok(ForecastReport { city, series })
    }
}

impl ForecastItem {
    fn into_interval(self) -> Result<ForecastInterval> {
        let timestamp = DateTime::from_timestamp(self.dt, 0).ok_or_else(|| {
            invalid_data(format!("timestamp out of range: {}", self.dt))
        })?;
        let condition = self.weather.into_iter().next();

        Ok(ForecastInterval {
            timestamp,
            temperature_celsius: self.main.temp,
            humidity_percent: self.main.humidity,
            wind_speed_ms: self.wind.speed,
            precipitation_probability: self.pop,
            description: condition.as_ref().map(|c| c.description.clone()),
            icon: condition.map(|c| c.icon),
        })
    }
}

/// Upstream data that fails range or conversion checks
fn invalid_data<D: std::fmt::Display>(reason: D) -> FarmcastError {
    FarmcastError::provider(format!("Invalid forecast data received: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cod": "200",
        "cnt": 2,
        "list": [
            {
                "dt": 1718272800,
                "main": {"temp": 27.4, "humidity": 62},
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                "wind": {"speed": 3.1, "deg": 140},
                "pop": 0.35,
                "dt_txt": "2024-06-13 10:00:00"
            },
            {
                "dt": 1718283600,
                "main": {"temp": 25.0, "humidity": 70},
                "weather": [],
                "wind": {"speed": 2.0}
            }
        ],
        "city": {"name": "Nakuru", "country": "KE", "coord": {"lat": -0.3031, "lon": 36.08}}
    }"#;

    #[test]
    fn test_response_conversion() {
        let response: ForecastResponse = serde_json::from_str(SAMPLE).unwrap();
        let report = response.into_report("nakuru").unwrap();

        assert_eq!(report.city.name, "Nakuru");
        assert_eq!(report.city.country.as_deref(), Some("KE"));
        assert_eq!(report.city.latitude, Some(-0.3031));
        assert_eq!(report.series.len(), 2);

        let first = &report.series.intervals()[0];
        assert_eq!(first.timestamp.timestamp(), 1_718_272_800);
        assert_eq!(first.temperature_celsius, 27.4);
        assert_eq!(first.humidity_percent, 62);
        assert_eq!(first.wind_speed_ms, 3.1);
        assert_eq!(first.precipitation_probability, 0.35);
        assert_eq!(first.description.as_deref(), Some("light rain"));
        assert_eq!(first.icon.as_deref(), Some("10d"));

        let second = &report.series.intervals()[1];
        assert_eq!(second.precipitation_probability, 0.0);
        assert!(second.description.is_none());
    }

    #[test]
    fn test_missing_list_and_city() {
        let response: ForecastResponse = serde_json::from_str(r#"{"cod": "200"}"#).unwrap();
        let report = response.into_report("Eldoret").unwrap();
        assert!(report.series.is_empty());
        assert_eq!(report.city, City::named("Eldoret"));
    }

    #[test]
    fn test_malformed_interval_is_rejected() {
        let payload = serde_json::json!({"list": [{
            "dt": 1718272800,
            "main": {"temp": 20.0, "humidity": 50},
            "wind": {"speed": 2.0},
            "pop": 1.5
        }]});
        let response: ForecastResponse = serde_json::from_value(payload).unwrap();
        let err = response.into_report("x").unwrap_err();
        assert!(matches!(err, FarmcastError::Provider { .. }));
        assert!(err.to_string().contains("Invalid forecast data received"));
        assert_eq!(err.user_message(), "Error fetching weather");
    }

    #[test]
    fn test_out_of_range_timestamp_is_provider_error() {
        let payload = serde_json::json!({"list": [{
            "dt": i64::MAX,
            "main": {"temp": 20.0, "humidity": 50},
            "wind": {"speed": 2.0}
        }]});
        let response: ForecastResponse = serde_json::from_value(payload).unwrap();
        assert!(matches!(
            response.into_report("x"),
            Err(FarmcastError::Provider { .. })
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = WeatherConfig::default();
        assert!(matches!(
            OpenWeatherClient::new(&config),
            Err(FarmcastError::Config { .. })
        ));
    }

    #[test]
    fn test_forecast_url_encodes_location() {
        let config = WeatherConfig {
            api_key: Some("0123456789abcdef".to_string()),
            base_url: "https://api.example.com/data/2.5/".to_string(),
            ..WeatherConfig::default()
        };
        let client = OpenWeatherClient::new(&config).unwrap();
        assert_eq!(
            client.forecast_url("São Paulo"),
            "https://api.example.com/data/2.5/forecast?q=S%C3%A3o%20Paulo&appid=0123456789abcdef&units=metric"
        );
    }
}
