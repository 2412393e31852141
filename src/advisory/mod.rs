//! Advisory engine
//!
//! Maps a chronological forecast series to an ordered, de-duplicated set of
//! farming advisories. Evaluation is a single pure pass over the rule table
//! in [`rules::RULES`]; there is no state shared between calls.

pub mod kind;
pub mod rules;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::ForecastInterval;
use rules::{RULES, RuleId};

pub use kind::{AdvisoryKind, ClassifiedAdvisory};

/// Returned alone when there is nothing to evaluate
pub const NO_FORECAST_DATA: &str = "No forecast data available to generate advisories.";
/// Returned alone when no rule fires
pub const STABLE_CONDITIONS: &str =
    "Weather conditions are stable — continue routine farming tasks.";

/// Ordered advisory texts without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AdvisorySet(Vec<String>);

impl AdvisorySet {
    /// Append `advisory` unless the exact text is already present.
    /// Returns whether it was added.
    pub fn insert<S: Into<String>>(&mut self, advisory: S) -> bool {
        let advisory = advisory.into();
        if self.contains(&advisory) {
            return false;
        }
        self.0.push(advisory);
        true
    }

    #[must_use]
    pub fn contains(&self, advisory: &str) -> bool {
        self.0.iter().any(|a| a == advisory)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Pair every advisory with its display classification
    #[must_use]
    pub fn classified(&self) -> Vec<ClassifiedAdvisory> {
        self.iter().map(ClassifiedAdvisory::new).collect()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for AdvisorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = AdvisorySet::default();
        for advisory in iter {
            set.insert(advisory);
        }
        set
    }
}

// Goes through `insert` so stored data cannot reintroduce duplicates
impl<'de> Deserialize<'de> for AdvisorySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(AdvisorySet::from_iter)
    }
}

impl<'a> IntoIterator for &'a AdvisorySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Derive farming advisories from a forecast series.
///
/// An empty series yields the single [`NO_FORECAST_DATA`] advisory; a series
/// on which no rule fires yields the single [`STABLE_CONDITIONS`] advisory.
#[must_use]
pub fn generate_advisories(intervals: &[ForecastInterval]) -> AdvisorySet {
    let mut advisories = AdvisorySet::default();

    if intervals.is_empty() {
        advisories.insert(NO_FORECAST_DATA);
        return advisories;
    }

    let mut fired: Vec<RuleId> = Vec::with_capacity(RULES.len());
    for rule in &RULES {
        if rule.is_suppressed(&fired) || !rule.matches(intervals) {
            continue;
        }
        tracing::trace!(rule = ?rule.id, "advisory rule fired");
        fired.push(rule.id);
        advisories.insert(rule.message);
    }

    if advisories.is_empty() {
        advisories.insert(STABLE_CONDITIONS);
    }

    advisories
}

#[cfg(test)]
mod tests {
    use super::rules::{FUNGAL_RISK, HEAT_STRESS, RAIN_RISK, SPRAY_WINDOW, WIND_DRIFT};
    use super::*;
    use chrono::{DateTime, Duration};

    fn interval(temp: f64, humidity: u8, wind_ms: f64, pop: f64) -> ForecastInterval {
        ForecastInterval::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            temp,
            humidity,
            wind_ms,
            pop,
        )
    }

    fn series(template: &ForecastInterval, count: usize) -> Vec<ForecastInterval> {
        (0..count)
            .map(|i| {
                let mut next = template.clone();
                next.timestamp += Duration::hours(3 * i as i64);
                next
            })
            .collect()
    }

    #[test]
    fn test_advisory_set_deduplicates() {
        let mut set = AdvisorySet::default();
        assert!(set.insert("a"));
        assert!(set.insert("b"));
        assert!(!set.insert("a"));
        assert_eq!(set.into_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let set: AdvisorySet = serde_json::from_str(r#"["a", "b", "a"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let set: AdvisorySet = [RAIN_RISK, FUNGAL_RISK].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, serde_json::json!([RAIN_RISK, FUNGAL_RISK]).to_string());
    }

    #[test]
    fn test_empty_series_yields_sentinel() {
        let advisories = generate_advisories(&[]);
        assert_eq!(advisories.into_vec(), vec![NO_FORECAST_DATA.to_string()]);
    }

    #[test]
    fn test_every_risk_rule_in_table_order() {
        let hot_wet_windy = interval(38.0, 90, 6.0, 0.9);
        let advisories = generate_advisories(&series(&hot_wet_windy, 4));
        assert_eq!(
            advisories.into_vec(),
            vec![RAIN_RISK, HEAT_STRESS, WIND_DRIFT, FUNGAL_RISK]
        );
    }

    #[test]
    fn test_rain_suppresses_spray_window() {
        // Calm first three intervals, heavy rain in the fourth
        let mut intervals = series(&interval(22.0, 50, 1.0, 0.05), 4);
        intervals[3].precipitation_probability = 0.8;
        let advisories = generate_advisories(&intervals);
        assert!(advisories.contains(RAIN_RISK));
        assert!(!advisories.contains(SPRAY_WINDOW));
    }

    #[test]
    fn test_wind_suppresses_spray_window() {
        let mut intervals = series(&interval(22.0, 50, 1.0, 0.05), 4);
        intervals[3].wind_speed_ms = 5.0;
        let advisories = generate_advisories(&intervals);
        assert!(advisories.contains(WIND_DRIFT));
        assert!(!advisories.contains(SPRAY_WINDOW));
    }

    #[test]
    fn test_humidity_does_not_suppress_spray_window() {
        let intervals = series(&interval(22.0, 85, 1.0, 0.05), 3);
        let advisories = generate_advisories(&intervals);
        assert_eq!(advisories.into_vec(), vec![FUNGAL_RISK, SPRAY_WINDOW]);
    }

    #[test]
    fn test_fallback_only_when_nothing_fires() {
        let intervals = series(&interval(22.0, 50, 12.0 / 3.6, 0.3), 4);
        let advisories = generate_advisories(&intervals);
        assert_eq!(advisories.into_vec(), vec![STABLE_CONDITIONS]);
    }

    #[test]
    fn test_empty_advisories_serialize_as_plain_array() {
        let advisories = generate_advisories(&[]);
        let json = serde_json::to_value(&advisories).unwrap();
        assert_eq!(json, serde_json::json!([NO_FORECAST_DATA]));
    }
}
