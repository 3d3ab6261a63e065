//! Error Taxonomy
//!
//! Both variants are recoverable per-call failures: the caller should surface
//! an "unsupported crop/disease" message and retry with corrected input.
//! Giving advice for the wrong crop is unsafe, so lookups never fall back to
//! a default entry.

use thiserror::Error;

/// Recoverable errors from knowledge-base lookups
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecommenderError {
    /// Crop is not in the supported set
    #[error("unsupported crop '{crop}' (supported: {supported})")]
    UnknownCrop { crop: String, supported: String },

    /// Disease label is not recognized for the given crop
    #[error("unknown disease '{disease}' for crop '{crop}'")]
    UnknownDisease { crop: String, disease: String },
}
