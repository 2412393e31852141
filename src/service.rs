//! Advisory service
//!
//! Ties the forecast provider, the forecast cache, the advisory engine and
//! the search history together for one location request.

use rand::RngExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::advisory::{AdvisorySet, generate_advisories};
use crate::config::FarmcastConfig;
use crate::models::{City, ForecastInterval, ResultSnapshot, SearchRecord};
use crate::storage::Storage;
use crate::weather::{ForecastProvider, ForecastReport};
use crate::{FarmcastError, Result};

/// Advisories for one location together with the forecast they came from
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryReport {
    pub city: City,
    pub advisory: AdvisorySet,
    pub forecast: Vec<ForecastInterval>,
}

pub struct AdvisoryService {
    provider: Arc<dyn ForecastProvider>,
    storage: Arc<Storage>,
    cache_ttl: Duration,
    history_list_limit: usize,
}

impl AdvisoryService {
    pub fn new(
        provider: Arc<dyn ForecastProvider>,
        storage: Arc<Storage>,
        cache_ttl: Duration,
        history_list_limit: usize,
    ) -> Self {
        Self {
            provider,
            storage,
            cache_ttl,
            history_list_limit: history_list_limit.max(1),
        }
    }

    /// Build the service with the TTL and list limit from `config`
    pub fn from_config(
        config: &FarmcastConfig,
        provider: Arc<dyn ForecastProvider>,
        storage: Arc<Storage>,
    ) -> Self {
        Self::new(
            provider,
            storage,
            Duration::from_secs(u64::from(config.cache.ttl_minutes) * 60),
            config.history.list_limit as usize,
        )
    }

    /// Fetch the forecast for `location`, derive advisories and record the search
    #[instrument(skip(self))]
    pub async fn advise(&self, location: &str) -> Result<AdvisoryReport> {
        let location = location.trim();
        if location.is_empty() {
            return Err(FarmcastError::validation("Location is required."));
        }

        let report = self.forecast(location).await?;
        let advisory = generate_advisories(report.series.intervals());
        info!(
            city = %report.city.name,
            advisories = advisory.len(),
            "Generated advisories"
        );

        if let Some(current) = report.series.current() {
            let record = SearchRecord::new(report.city.name.clone(), ResultSnapshot::from(current));
            if let Err(e) = self.storage.history().record(record).await {
                warn!("Failed to record search history: {e:#}");
            }
        }

        Ok(AdvisoryReport {
            city: report.city,
            advisory,
            forecast: report.series.into_intervals(),
        })
    }

    /// Most recent searches, newest first
    pub async fn recent_searches(&self, limit: Option<usize>) -> Result<Vec<SearchRecord>> {
        let limit = limit.unwrap_or(self.history_list_limit).max(1);
        Ok(self.storage.history().recent(limit).await?)
    }

    pub async fn clear_history(&self) -> Result<()> {
        Ok(self.storage.history().clear().await?)
    }

    async fn forecast(&self, location: &str) -> Result<ForecastReport> {
        let key = cache_key(location);

        match self.storage.cache().get::<ForecastReport>(&key).await {
            Ok(Some(cached)) => {
                debug!("Using cached forecast");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!("Forecast cache lookup failed: {e:#}"),
        }

        let report = self.provider.fetch_forecast(location).await?;

        if !self.cache_ttl.is_zero() {
            let jitter: f32 = rand::rng().random_range(0.9..1.1);
            let ttl = self.cache_ttl.mul_f32(jitter);
            if let Err(e) = self.storage.cache().put(&key, report.clone(), ttl).await {
                warn!("Failed to cache forecast: {e:#}");
            }
        }

        Ok(report)
    }
}

fn cache_key(location: &str) -> String {
    format!("forecast:{}", location.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{NO_FORECAST_DATA, rules::HEAT_STRESS};
    use crate::models::ForecastSeries;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        series: ForecastSeries,
    }

    #[async_trait]
    impl ForecastProvider for CountingProvider {
        async fn fetch_forecast(&self, location: &str) -> Result<ForecastReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ForecastReport {
                city: City::named(format!("{location} City")),
                series: self.series.clone(),
            })
        }
    }

    fn hot_series() -> ForecastSeries {
        let interval = ForecastInterval::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            40.0,
            50,
            2.0,
            0.05,
        );
        ForecastSeries::new(vec![interval]).unwrap()
    }

    fn service(
        dir: &tempfile::TempDir,
        series: ForecastSeries,
        ttl: Duration,
    ) -> (AdvisoryService, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            series,
        });
        let storage = Arc::new(Storage::open(dir.path(), 10).unwrap());
        let service = AdvisoryService::new(provider.clone(), storage, ttl, 5);
        (service, provider)
    }

    #[tokio::test]
    async fn test_blank_location_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (service, provider) = service(&dir, hot_series(), Duration::from_secs(60));

        let err = service.advise("   ").await.unwrap_err();
        assert!(matches!(err, FarmcastError::Validation { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_advise_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir, hot_series(), Duration::from_secs(60));

        let report = service.advise(" Garissa ").await.unwrap();
        assert!(report.advisory.contains(HEAT_STRESS));
        assert_eq!(report.forecast.len(), 1);

        let history = service.recent_searches(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].location, "Garissa City");
        assert_eq!(history[0].snapshot.temperature_celsius, 40.0);
    }

    #[tokio::test]
    async fn test_forecast_is_cached_per_location() {
        let dir = tempfile::tempdir().unwrap();
        let (service, provider) = service(&dir, hot_series(), Duration::from_secs(600));

        service.advise("Garissa").await.unwrap();
        service.advise("garissa").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        service.advise("Lodwar").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (service, provider) = service(&dir, hot_series(), Duration::ZERO);

        service.advise("Garissa").await.unwrap();
        service.advise("Garissa").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_forecast_returns_sentinel_without_history() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir, ForecastSeries::empty(), Duration::from_secs(60));

        let report = service.advise("Nowhere").await.unwrap();
        assert_eq!(report.advisory.into_vec(), vec![NO_FORECAST_DATA]);
        assert!(service.recent_searches(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_history() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir, hot_series(), Duration::from_secs(60));

        service.advise("Garissa").await.unwrap();
        service.clear_history().await.unwrap();
        assert!(service.recent_searches(Some(3)).await.unwrap().is_empty());
    }

    #[test]
    fn test_cache_key_normalizes() {
        assert_eq!(cache_key("  Nairobi "), "forecast:nairobi");
    }
}
