//! Recommendation Engine
//!
//! Composes the severity classifier, weather risk assessor and knowledge-base
//! lookup into a single ranked recommendation. Pure and stateless per call:
//! identical inputs against the same knowledge-base snapshot yield identical
//! output, so the engine is safe to share across request handlers without
//! locking.

use crate::config::RecommenderConfig;
use crate::error::RecommenderError;
use crate::kb::{ControlAction, ControlTier, KnowledgeBase, TieredActions};
use crate::severity::{SeverityClassifier, SeverityTier};
use crate::weather::{RiskAssessor, RiskLevel, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Disease label that short-circuits to an empty recommendation
const DEFAULT_HEALTHY_LABEL: &str = "healthy";

/// Classifier collaborator output consumed as engine input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Predicted disease label
    pub label: String,

    /// Model confidence in [0, 1]
    pub confidence: f64,
}

impl Diagnosis {
    /// Derive a severity percentage from model confidence
    ///
    /// Convenience for callers whose classifier supplies no separate severity
    /// estimate. The confidence → severity mapping is caller policy; the
    /// engine itself only ever sees a severity percentage.
    pub fn severity_from_confidence(&self) -> f64 {
        SeverityClassifier::clamp_pct(self.confidence * 100.0)
    }
}

/// Structured recommendation returned to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop: String,
    pub disease: String,

    /// Severity after clamping into [0, 100], the value the tier was derived from
    pub severity_pct: f64,
    pub severity_tier: SeverityTier,
    pub risk_level: RiskLevel,

    /// Selected actions in cultural → biological → chemical order;
    /// knowledge-base insertion order inside each tier
    pub actions: Vec<ControlAction>,

    /// Human-readable summary of which inclusion rule fired per tier
    pub explanation: String,
}

/// Recommendation decision engine
///
/// Holds an immutable knowledge-base snapshot behind `Arc`. Replacing the
/// snapshot swaps the whole table at once, so concurrent readers observe
/// either the old or the new table in full.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    kb: Arc<KnowledgeBase>,
    severity: SeverityClassifier,
    risk: RiskAssessor,
    healthy_label: String,
}

impl RecommendationEngine {
    pub fn new(kb: Arc<KnowledgeBase>, config: RecommenderConfig) -> Self {
        Self {
            kb,
            severity: SeverityClassifier::new(config.severity),
            risk: RiskAssessor::new(config.weather),
            healthy_label: DEFAULT_HEALTHY_LABEL.to_string(),
        }
    }

    /// Engine over the built-in knowledge base and default thresholds
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(KnowledgeBase::builtin()),
            RecommenderConfig::default(),
        )
    }

    /// Override the label treated as a healthy diagnosis
    pub fn with_healthy_label(mut self, label: &str) -> Self {
        self.healthy_label = crate::kb::normalize_key(label);
        self
    }

    /// Current knowledge-base snapshot
    pub fn kb(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Atomically replace the knowledge-base snapshot
    pub fn replace_kb(&mut self, kb: Arc<KnowledgeBase>) {
        self.kb = kb;
    }

    /// Produce a recommendation for one diagnosis
    ///
    /// Propagates `UnknownCrop`/`UnknownDisease` unchanged; never fails on
    /// out-of-range severity or weather values (those are clamped by the
    /// classifier and assessor).
    pub fn recommend(
        &self,
        crop: &str,
        disease: &str,
        severity_pct: f64,
        weather: Option<&WeatherSnapshot>,
    ) -> Result<Recommendation, RecommenderError> {
        let crop = crate::kb::normalize_key(crop);
        let disease = crate::kb::normalize_key(disease);

        self.kb.ensure_crop(&crop)?;

        let severity_pct = SeverityClassifier::clamp_pct(severity_pct);
        let severity_tier = self.severity.classify(severity_pct);
        let risk_level = self.risk.assess(weather);

        // Healthy diagnosis: severity and weather carry no meaning, return
        // an empty plan rather than consulting the knowledge base.
        if disease == self.healthy_label {
            tracing::debug!(crop = %crop, "healthy diagnosis, no treatment needed");
            return Ok(Recommendation {
                crop,
                disease,
                severity_pct,
                severity_tier,
                risk_level,
                actions: Vec::new(),
                explanation: "no treatment needed: the plant is diagnosed healthy".to_string(),
            });
        }

        let candidates = self.kb.lookup(&crop, &disease)?;

        let mut actions = Vec::new();
        let mut tier_notes = Vec::with_capacity(3);

        for tier in ControlTier::ALL {
            let (included, reason) = tier_rule(tier, severity_tier, risk_level);
            if included {
                actions.extend_from_slice(candidates.tier(tier));
            }
            tier_notes.push(format!(
                "{}: {} ({})",
                tier.display_text(),
                if included { "included" } else { "excluded" },
                reason
            ));
        }

        let explanation = format!(
            "severity {:.1}% ({}), weather risk {}; {}",
            severity_pct,
            severity_tier.display_text(),
            risk_level.display_text(),
            tier_notes.join("; ")
        );

        tracing::debug!(
            crop = %crop,
            disease = %disease,
            severity = severity_pct,
            tier = severity_tier.display_text(),
            risk = risk_level.display_text(),
            actions = actions.len(),
            "built recommendation"
        );

        Ok(Recommendation {
            crop,
            disease,
            severity_pct,
            severity_tier,
            risk_level,
            actions,
            explanation,
        })
    }

    /// Produce a recommendation per diagnosis (the classifier collaborator
    /// typically returns its top-k predictions per image)
    ///
    /// Each diagnosis is handled independently; an unknown label fails only
    /// its own entry.
    pub fn recommend_all(
        &self,
        crop: &str,
        diagnoses: &[Diagnosis],
        weather: Option<&WeatherSnapshot>,
    ) -> Vec<Result<Recommendation, RecommenderError>> {
        diagnoses
            .iter()
            .map(|d| self.recommend(crop, &d.label, d.severity_from_confidence(), weather))
            .collect()
    }

    /// Tiered view of a recommendation's actions, for callers that render
    /// tier sections instead of one flat list
    pub fn group_by_tier(recommendation: &Recommendation) -> TieredActions {
        let mut grouped = TieredActions::default();
        for action in &recommendation.actions {
            match action.tier {
                ControlTier::Cultural => grouped.cultural.push(action.clone()),
                ControlTier::Biological => grouped.biological.push(action.clone()),
                ControlTier::Chemical => grouped.chemical.push(action.clone()),
            }
        }
        grouped
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Tier inclusion policy, monotonic in both severity and risk
///
/// - cultural: always (baseline hygiene regardless of pressure)
/// - biological: severity or weather risk at least medium
/// - chemical: severity high, or medium severity under high weather risk
///
/// Returns the decision plus the reason used in the explanation string.
fn tier_rule(
    tier: ControlTier,
    severity: SeverityTier,
    risk: RiskLevel,
) -> (bool, &'static str) {
    match tier {
        ControlTier::Cultural => (true, "baseline practice"),
        ControlTier::Biological => match (severity >= SeverityTier::Medium, risk >= RiskLevel::Medium) {
            (true, true) => (true, "severity and weather risk at least medium"),
            (true, false) => (true, "severity at least medium"),
            (false, true) => (true, "weather risk at least medium"),
            (false, false) => (false, "severity and weather risk both low"),
        },
        ControlTier::Chemical => {
            if severity == SeverityTier::High {
                (true, "severity high")
            } else if severity == SeverityTier::Medium && risk == RiskLevel::High {
                (true, "medium severity under high weather risk")
            } else {
                (false, "combined pressure below chemical threshold")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RecommendationEngine {
        RecommendationEngine::builtin()
    }

    fn weather(humidity_pct: f64, temperature_c: f64, rain_mm: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            humidity_pct,
            temperature_c,
            rain_mm,
        }
    }

    #[test]
    fn high_pressure_includes_all_three_tiers_in_order() {
        // severity 25% is high; humidity 85 + temp 22 give high weather risk
        let rec = engine()
            .recommend("tomato", "early_blight", 25.0, Some(&weather(85.0, 22.0, 0.0)))
            .unwrap();

        assert_eq!(rec.severity_tier, SeverityTier::High);
        assert_eq!(rec.risk_level, RiskLevel::High);

        let tiers: Vec<ControlTier> = rec.actions.iter().map(|a| a.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted, "tiers must appear cultural → biological → chemical");

        assert!(tiers.contains(&ControlTier::Cultural));
        assert!(tiers.contains(&ControlTier::Biological));
        assert!(tiers.contains(&ControlTier::Chemical));
    }

    #[test]
    fn low_pressure_keeps_only_cultural() {
        let rec = engine()
            .recommend("tomato", "early_blight", 10.0, Some(&weather(50.0, 5.0, 0.0)))
            .unwrap();

        assert_eq!(rec.severity_tier, SeverityTier::Low);
        assert_eq!(rec.risk_level, RiskLevel::Low);
        assert!(!rec.actions.is_empty());
        assert!(rec.actions.iter().all(|a| a.tier == ControlTier::Cultural));
    }

    #[test]
    fn low_severity_high_risk_adds_biological_but_not_chemical() {
        let rec = engine()
            .recommend("tomato", "early_blight", 10.0, Some(&weather(85.0, 22.0, 0.0)))
            .unwrap();

        assert_eq!(rec.risk_level, RiskLevel::High);
        assert!(rec.actions.iter().any(|a| a.tier == ControlTier::Biological));
        assert!(rec.actions.iter().all(|a| a.tier != ControlTier::Chemical));
    }

    #[test]
    fn medium_severity_needs_high_risk_for_chemical() {
        let e = engine();

        // medium severity, medium risk (one high signal): no chemical
        let rec = e
            .recommend("tomato", "early_blight", 20.0, Some(&weather(50.0, 20.0, 0.0)))
            .unwrap();
        assert_eq!(rec.severity_tier, SeverityTier::Medium);
        assert_eq!(rec.risk_level, RiskLevel::Medium);
        assert!(rec.actions.iter().all(|a| a.tier != ControlTier::Chemical));

        // medium severity, high risk: chemical escalation
        let rec = e
            .recommend("tomato", "early_blight", 20.0, Some(&weather(85.0, 22.0, 0.0)))
            .unwrap();
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert!(rec.actions.iter().any(|a| a.tier == ControlTier::Chemical));
        assert!(rec.explanation.contains("medium severity under high weather risk"));
    }

    #[test]
    fn healthy_diagnosis_short_circuits() {
        let rec = engine()
            .recommend("tomato", "healthy", 90.0, Some(&weather(85.0, 22.0, 5.0)))
            .unwrap();

        assert!(rec.actions.is_empty());
        assert!(rec.explanation.contains("no treatment needed"));
    }

    #[test]
    fn healthy_diagnosis_still_requires_known_crop() {
        let err = engine()
            .recommend("banana", "healthy", 90.0, None)
            .unwrap_err();
        assert!(matches!(err, RecommenderError::UnknownCrop { .. }));
    }

    #[test]
    fn lookup_errors_propagate_unchanged() {
        let e = engine();

        assert!(matches!(
            e.recommend("banana", "early_blight", 10.0, None).unwrap_err(),
            RecommenderError::UnknownCrop { .. }
        ));
        assert!(matches!(
            e.recommend("tomato", "stalk_rot", 10.0, None).unwrap_err(),
            RecommenderError::UnknownDisease { .. }
        ));
    }

    #[test]
    fn missing_weather_never_escalates() {
        // High severity alone still reaches chemical; missing weather only
        // means the risk contribution stays low.
        let rec = engine()
            .recommend("wheat", "rust", 40.0, None)
            .unwrap();

        assert_eq!(rec.risk_level, RiskLevel::Low);
        assert!(rec.actions.iter().any(|a| a.tier == ControlTier::Chemical));
    }

    #[test]
    fn included_tier_with_empty_slot_contributes_nothing() {
        // wheat/rust has no biological actions; the tier is included by rule
        // but adds no entries.
        let rec = engine()
            .recommend("wheat", "rust", 20.0, Some(&weather(85.0, 22.0, 0.0)))
            .unwrap();

        assert!(rec.explanation.contains("biological: included"));
        assert!(rec.actions.iter().all(|a| a.tier != ControlTier::Biological));
    }

    #[test]
    fn explanation_names_the_rule_per_tier() {
        let rec = engine()
            .recommend("tomato", "early_blight", 10.0, Some(&weather(50.0, 5.0, 0.0)))
            .unwrap();

        assert!(rec.explanation.contains("cultural: included (baseline practice)"));
        assert!(rec.explanation.contains("biological: excluded"));
        assert!(rec.explanation.contains("chemical: excluded"));
    }

    #[test]
    fn recommend_is_idempotent() {
        let e = engine();
        let w = weather(85.0, 22.0, 0.0);

        let first = e.recommend("tomato", "early_blight", 25.0, Some(&w)).unwrap();
        let second = e.recommend("tomato", "early_blight", 25.0, Some(&w)).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn severity_is_recorded_after_clamping() {
        let rec = engine()
            .recommend("tomato", "early_blight", 150.0, None)
            .unwrap();

        assert_eq!(rec.severity_pct, 100.0);
        assert_eq!(rec.severity_tier, SeverityTier::High);
    }

    #[test]
    fn recommend_all_handles_each_diagnosis_independently() {
        let e = engine();
        let diagnoses = vec![
            Diagnosis { label: "early_blight".to_string(), confidence: 0.92 },
            Diagnosis { label: "healthy".to_string(), confidence: 0.05 },
            Diagnosis { label: "rust".to_string(), confidence: 0.03 },
        ];

        let results = e.recommend_all("tomato", &diagnoses, None);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap().actions.is_empty());
        // rust is not a tomato disease
        assert!(matches!(
            results[2].as_ref().unwrap_err(),
            RecommenderError::UnknownDisease { .. }
        ));
    }

    #[test]
    fn severity_from_confidence_scales_and_clamps() {
        let d = Diagnosis { label: "early_blight".to_string(), confidence: 0.92 };
        assert_eq!(d.severity_from_confidence(), 92.0);

        let d = Diagnosis { label: "early_blight".to_string(), confidence: 1.4 };
        assert_eq!(d.severity_from_confidence(), 100.0);
    }

    #[test]
    fn group_by_tier_splits_the_flat_list() {
        let rec = engine()
            .recommend("tomato", "early_blight", 25.0, Some(&weather(85.0, 22.0, 0.0)))
            .unwrap();

        let grouped = RecommendationEngine::group_by_tier(&rec);
        assert_eq!(
            grouped.cultural.len() + grouped.biological.len() + grouped.chemical.len(),
            rec.actions.len()
        );
        assert!(grouped.chemical.iter().all(|a| a.tier == ControlTier::Chemical));
    }

    #[test]
    fn replace_kb_swaps_the_whole_snapshot() {
        let mut e = engine();
        assert!(e.recommend("tomato", "early_blight", 10.0, None).is_ok());

        // New snapshot with a single crop: old entries are gone atomically
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        write!(
            file,
            r#"{{"grape": {{"downy_mildew": {{"cultural": [{{"id": "canopy", "description": "Open the canopy"}}]}}}}}}"#
        )
        .unwrap();
        let new_kb = KnowledgeBase::load(file.path()).unwrap();

        e.replace_kb(Arc::new(new_kb));
        assert!(matches!(
            e.recommend("tomato", "early_blight", 10.0, None).unwrap_err(),
            RecommenderError::UnknownCrop { .. }
        ));
        assert!(e.recommend("grape", "downy_mildew", 10.0, None).is_ok());
    }
}
