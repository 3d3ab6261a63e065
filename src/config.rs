//! Threshold Configuration
//!
//! Explicit configuration structs injected into the severity classifier and
//! the weather risk assessor at construction time. Defaults carry the
//! documented agronomic constants; a JSON file can override any of them
//! without touching engine code.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Severity tier thresholds (percent leaf/canopy damage, inclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Below this percentage only cultural controls are recommended
    pub low_max: f64,

    /// At or above this percentage chemical controls are considered
    pub high_min: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            low_max: 15.0,
            high_min: 25.0,
        }
    }
}

/// Weather risk signal thresholds
///
/// The temperature band is the disease-favorable range for the foliar
/// pathogens covered by the built-in knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherRiskThresholds {
    /// Relative humidity (%) at or above which the humidity signal is high
    pub high_humidity_pct: f64,

    /// Relative humidity (%) at or above which the humidity signal is medium
    pub medium_humidity_pct: f64,

    /// Lower bound (°C) of the disease-favorable temperature band
    pub optimal_temp_min_c: f64,

    /// Upper bound (°C) of the disease-favorable temperature band
    pub optimal_temp_max_c: f64,

    /// Rainfall (mm) above which the rain signal is high
    pub rain_risk_mm: f64,
}

impl Default for WeatherRiskThresholds {
    fn default() -> Self {
        Self {
            high_humidity_pct: 80.0,
            medium_humidity_pct: 60.0,
            optimal_temp_min_c: 15.0,
            optimal_temp_max_c: 30.0,
            rain_risk_mm: 0.1,
        }
    }
}

/// Complete recommender configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub severity: SeverityThresholds,
    pub weather: WeatherRiskThresholds,
}

impl RecommenderConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to the documented defaults, so a partial
    /// override file is valid.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: RecommenderConfig =
            serde_json::from_str(&contents).with_context(|| "Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations that would make tier boundaries overlap
    pub fn validate(&self) -> Result<()> {
        if self.severity.low_max > self.severity.high_min {
            anyhow::bail!(
                "severity low_max ({}) must not exceed high_min ({})",
                self.severity.low_max,
                self.severity.high_min
            );
        }

        if self.weather.medium_humidity_pct > self.weather.high_humidity_pct {
            anyhow::bail!(
                "medium_humidity_pct ({}) must not exceed high_humidity_pct ({})",
                self.weather.medium_humidity_pct,
                self.weather.high_humidity_pct
            );
        }

        if self.weather.optimal_temp_min_c > self.weather.optimal_temp_max_c {
            anyhow::bail!(
                "optimal_temp_min_c ({}) must not exceed optimal_temp_max_c ({})",
                self.weather.optimal_temp_min_c,
                self.weather.optimal_temp_max_c
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_constants() {
        let config = RecommenderConfig::default();
        assert_eq!(config.severity.low_max, 15.0);
        assert_eq!(config.severity.high_min, 25.0);
        assert_eq!(config.weather.high_humidity_pct, 80.0);
        assert_eq!(config.weather.medium_humidity_pct, 60.0);
        assert_eq!(config.weather.optimal_temp_min_c, 15.0);
        assert_eq!(config.weather.optimal_temp_max_c, 30.0);
        assert_eq!(config.weather.rain_risk_mm, 0.1);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"severity": {{"high_min": 40.0}}}}"#).unwrap();

        let config = RecommenderConfig::load(file.path()).unwrap();
        assert_eq!(config.severity.high_min, 40.0);
        assert_eq!(config.severity.low_max, 15.0);
        assert_eq!(config.weather.rain_risk_mm, 0.1);
    }

    #[test]
    fn inverted_severity_thresholds_rejected() {
        let config = RecommenderConfig {
            severity: SeverityThresholds {
                low_max: 50.0,
                high_min: 25.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_temperature_band_rejected() {
        let mut config = RecommenderConfig::default();
        config.weather.optimal_temp_min_c = 35.0;
        assert!(config.validate().is_err());
    }
}
