//! Advisory rule table
//!
//! Each rule is a tagged record: the window it looks at, whether any or all
//! intervals in that window must match, the per-interval predicate, the
//! advisory text, and the rules whose firing suppresses it. Rules are
//! evaluated in table order, so a rule can only be suppressed by rules that
//! come before it.

use crate::models::ForecastInterval;

/// Precipitation probability above which rain is considered likely
pub const RAIN_RISK_POP: f64 = 0.60;
/// Temperature above which crops suffer heat stress (Celsius)
pub const HEAT_STRESS_CELSIUS: f64 = 35.0;
/// Wind speed above which spray drifts (km/h)
pub const WIND_DRIFT_KMH: f64 = 15.0;
/// Humidity above which fungal infection is likely (percent)
pub const FUNGAL_RISK_HUMIDITY: u8 = 80;
/// Wind speed below which foliar spraying is safe (km/h)
pub const SPRAY_WINDOW_MAX_WIND_KMH: f64 = 10.0;
/// Precipitation probability below which foliar spraying is safe
pub const SPRAY_WINDOW_MAX_POP: f64 = 0.20;

pub const RAIN_RISK: &str = "High rain probability — avoid irrigation and pesticide spraying.";
pub const HEAT_STRESS: &str =
    "High temperature warning — increase irrigation for heat-sensitive crops.";
pub const WIND_DRIFT: &str = "Strong winds — avoid pesticide spraying due to drift risk.";
pub const FUNGAL_RISK: &str = "High humidity — monitor crop for fungal infection risk.";
pub const SPRAY_WINDOW: &str =
    "Good window — low wind and negligible rain risk, suitable for foliar treatment.";

/// Leading slice of the forecast a rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Next ~12 hours (4 x 3h intervals)
    Near,
    /// Next ~9 hours (3 x 3h intervals)
    Immediate,
}

impl Window {
    /// Number of intervals the window covers
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Window::Near => 4,
            Window::Immediate => 3,
        }
    }

    /// The window over `intervals`, shortened when fewer are available
    #[must_use]
    pub fn slice(self, intervals: &[ForecastInterval]) -> &[ForecastInterval] {
        &intervals[..self.size().min(intervals.len())]
    }
}

/// How the predicate is applied across the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    RainRisk,
    HeatStress,
    WindDrift,
    FungalRisk,
    SprayWindow,
}

#[derive(Debug)]
pub struct Rule {
    pub id: RuleId,
    pub window: Window,
    pub quantifier: Quantifier,
    pub predicate: fn(&ForecastInterval) -> bool,
    pub message: &'static str,
    pub suppressed_by: &'static [RuleId],
}

impl Rule {
    /// Whether the rule's condition holds over its window.
    /// An empty window never matches.
    #[must_use]
    pub fn matches(&self, intervals: &[ForecastInterval]) -> bool {
        let window = self.window.slice(intervals);
        if window.is_empty() {
            return false;
        }
        match self.quantifier {
            Quantifier::Any => window.iter().any(self.predicate),
            Quantifier::All => window.iter().all(self.predicate),
        }
    }

    /// Whether any of the already fired rules suppresses this one
    #[must_use]
    pub fn is_suppressed(&self, fired: &[RuleId]) -> bool {
        self.suppressed_by.iter().any(|id| fired.contains(id))
    }
}

fn rain_risk(interval: &ForecastInterval) -> bool {
    interval.precipitation_probability > RAIN_RISK_POP
}

fn heat_stress(interval: &ForecastInterval) -> bool {
    interval.temperature_celsius > HEAT_STRESS_CELSIUS
}

fn drifting_wind(kmh: f64) -> bool {
    kmh > WIND_DRIFT_KMH
}

fn calm_wind(kmh: f64) -> bool {
    kmh < SPRAY_WINDOW_MAX_WIND_KMH
}

fn wind_drift(interval: &ForecastInterval) -> bool {
    drifting_wind(interval.wind_speed_kmh())
}

fn fungal_risk(interval: &ForecastInterval) -> bool {
    interval.humidity_percent > FUNGAL_RISK_HUMIDITY
}

fn calm_and_dry(interval: &ForecastInterval) -> bool {
    calm_wind(interval.wind_speed_kmh())
        && interval.precipitation_probability < SPRAY_WINDOW_MAX_POP
}

/// All rules in evaluation order
pub static RULES: [Rule; 5] = [
    Rule {
        id: RuleId::RainRisk,
        window: Window::Near,
        quantifier: Quantifier::Any,
        predicate: rain_risk,
        message: RAIN_RISK,
        suppressed_by: &[],
    },
    Rule {
        id: RuleId::HeatStress,
        window: Window::Near,
        quantifier: Quantifier::Any,
        predicate: heat_stress,
        message: HEAT_STRESS,
        suppressed_by: &[],
    },
    Rule {
        id: RuleId::WindDrift,
        window: Window::Near,
        quantifier: Quantifier::Any,
        predicate: wind_drift,
        message: WIND_DRIFT,
        suppressed_by: &[],
    },
    Rule {
        id: RuleId::FungalRisk,
        window: Window::Near,
        quantifier: Quantifier::Any,
        predicate: fungal_risk,
        message: FUNGAL_RISK,
        suppressed_by: &[],
    },
    Rule {
        id: RuleId::SprayWindow,
        window: Window::Immediate,
        quantifier: Quantifier::All,
        predicate: calm_and_dry,
        message: SPRAY_WINDOW,
        suppressed_by: &[RuleId::RainRisk, RuleId::WindDrift],
    },
];
