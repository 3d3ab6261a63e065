//! Severity Classification
//!
//! Maps a numeric severity percentage to a qualitative tier using fixed,
//! injectable thresholds. Out-of-range inputs are clamped to [0, 100] rather
//! than rejected: the classifier is total over all finite inputs.

use crate::config::SeverityThresholds;
use serde::{Deserialize, Serialize};

/// Qualitative severity tier, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

impl SeverityTier {
    pub fn display_text(&self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
        }
    }
}

/// Severity classifier with injected thresholds
#[derive(Debug, Clone, Copy)]
pub struct SeverityClassifier {
    thresholds: SeverityThresholds,
}

impl SeverityClassifier {
    pub fn new(thresholds: SeverityThresholds) -> Self {
        Self { thresholds }
    }

    /// Clamp a severity percentage into [0, 100]
    ///
    /// Non-finite values (NaN, infinities from a bad upstream division) are
    /// treated as 0: an unusable severity estimate must not escalate
    /// treatment on its own.
    pub fn clamp_pct(pct: f64) -> f64 {
        if !pct.is_finite() {
            tracing::warn!(pct, "non-finite severity, defaulting to 0");
            return 0.0;
        }
        if !(0.0..=100.0).contains(&pct) {
            tracing::warn!(pct, "severity out of [0, 100], clamping");
        }
        pct.clamp(0.0, 100.0)
    }

    /// Classify a severity percentage into a tier
    ///
    /// Inclusive lower bounds: `pct < low_max` is low, `pct < high_min` is
    /// medium, everything else is high.
    pub fn classify(&self, pct: f64) -> SeverityTier {
        let pct = Self::clamp_pct(pct);

        if pct < self.thresholds.low_max {
            SeverityTier::Low
        } else if pct < self.thresholds.high_min {
            SeverityTier::Medium
        } else {
            SeverityTier::High
        }
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new(SeverityThresholds::default())
    }
}
