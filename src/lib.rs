//! Pest Recommender Rust Implementation
//!
//! Recommendation decision engine for crop pest/disease control: maps
//! `(crop, disease, severity, weather)` to a ranked, tiered set of control
//! actions (cultural / biological / chemical) adjusted by weather-derived
//! disease pressure.
//!
//! Module layout:
//! - `config`: threshold configuration with documented defaults
//! - `severity`: severity percentage → tier classification
//! - `weather`: weather snapshot → risk level assessment
//! - `kb`: static crop/disease → control action knowledge base
//! - `engine`: composition into a structured recommendation
//!
//! Image classification and weather retrieval are external collaborators;
//! this crate consumes their outputs and performs no I/O beyond optional
//! config/knowledge-base file loading at startup.

pub mod config;
pub mod engine;
pub mod error;
pub mod kb;
pub mod severity;
pub mod weather;

// Re-export commonly used types
pub use config::{RecommenderConfig, SeverityThresholds, WeatherRiskThresholds};
pub use engine::{Diagnosis, Recommendation, RecommendationEngine};
pub use error::RecommenderError;
pub use kb::{ControlAction, ControlTier, KnowledgeBase, TieredActions};
pub use severity::{SeverityClassifier, SeverityTier};
pub use weather::{RiskAssessor, RiskLevel, RiskSignals, WeatherSnapshot};
