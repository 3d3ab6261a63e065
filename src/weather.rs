//! Weather Risk Assessment
//!
//! Derives a qualitative disease-pressure risk level from a weather snapshot
//! using three independent signals (humidity, temperature band, rainfall)
//! combined by a majority rule, so a single noisy signal (a light drizzle)
//! never dominates the outcome on its own.

use crate::config::WeatherRiskThresholds;
use serde::{Deserialize, Serialize};

/// Weather conditions at the field site, supplied by the weather collaborator
///
/// The assessor never mutates a snapshot. Absence of data is an explicit
/// `None` at the call site, not a zeroed struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Relative humidity in percent, [0, 100]
    pub humidity_pct: f64,

    /// Air temperature in °C
    pub temperature_c: f64,

    /// Recent rainfall in mm, >= 0
    pub rain_mm: f64,
}

/// Qualitative weather-driven risk level, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn display_text(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Per-signal breakdown, kept so explanations can name the signals that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskSignals {
    pub humidity_high: bool,
    pub humidity_medium: bool,
    pub temperature_high: bool,
    pub rain_high: bool,
}

impl RiskSignals {
    /// Number of signals at their high level
    pub fn high_count(&self) -> usize {
        [self.humidity_high, self.temperature_high, self.rain_high]
            .iter()
            .filter(|&&s| s)
            .count()
    }
}

/// Weather risk assessor with injected thresholds
#[derive(Debug, Clone, Copy)]
pub struct RiskAssessor {
    thresholds: WeatherRiskThresholds,
}

impl RiskAssessor {
    pub fn new(thresholds: WeatherRiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Assess risk from an optional snapshot
    ///
    /// Missing weather is the fail-safe default `Low`: unknown conditions
    /// must neither suppress cultural advice nor escalate to chemical
    /// controls.
    pub fn assess(&self, weather: Option<&WeatherSnapshot>) -> RiskLevel {
        match weather {
            Some(snapshot) => self.assess_snapshot(snapshot),
            None => {
                tracing::debug!("no weather data, defaulting risk to low");
                RiskLevel::Low
            }
        }
    }

    /// Compute the three signals for a snapshot
    ///
    /// Malformed fields are clamped rather than rejected: humidity into
    /// [0, 100], negative rainfall to 0. NaN never satisfies a comparison,
    /// so a NaN field simply contributes no high signal.
    pub fn signals(&self, weather: &WeatherSnapshot) -> RiskSignals {
        let humidity = weather.humidity_pct.clamp(0.0, 100.0);
        let rain = weather.rain_mm.max(0.0);

        RiskSignals {
            humidity_high: humidity >= self.thresholds.high_humidity_pct,
            humidity_medium: humidity >= self.thresholds.medium_humidity_pct,
            temperature_high: weather.temperature_c >= self.thresholds.optimal_temp_min_c
                && weather.temperature_c <= self.thresholds.optimal_temp_max_c,
            rain_high: rain > self.thresholds.rain_risk_mm,
        }
    }

    /// Majority combination: >= 2 high signals is high, exactly 1 is medium,
    /// none is low
    pub fn assess_snapshot(&self, weather: &WeatherSnapshot) -> RiskLevel {
        let signals = self.signals(weather);

        let level = match signals.high_count() {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        };

        tracing::debug!(
            humidity = weather.humidity_pct,
            temperature = weather.temperature_c,
            rain = weather.rain_mm,
            risk = level.display_text(),
            "assessed weather risk"
        );

        level
    }
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new(WeatherRiskThresholds::default())
    }
}
