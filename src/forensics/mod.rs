//! Forensic signal modules: independent handcrafted checks, each inspecting
//! the same decoded image and emitting zero or more typed findings.
//!
//! Modules are:
//! - **Self-contained**: each owns its signature tables and thresholds
//! - **Immutable**: `inspect()` takes `&self` and a shared sample
//! - **Parallelizable**: the collector runs them concurrently
//! - **Degradable**: an erroring module contributes zero findings and
//!   never cancels its siblings

pub mod compression;
pub mod geometry;
pub mod metadata;

pub use compression::CompressionAnomalyScorer;
pub use geometry::FaceGeometryValidator;
pub use metadata::MetadataInspector;

use crate::config::VeriteConfig;
use crate::ingest::ImageSample;
use crate::signal::{FindingCategory, ForensicFinding};
use crate::VeriteResult;
use std::sync::Arc;

/// A single forensic check that can run independently
pub trait ForensicModule: Send + Sync {
    /// Stable id used in findings and the analysis log
    fn id(&self) -> &'static str;

    /// The discipline this module reports under
    fn category(&self) -> FindingCategory;

    /// Inspect the sample and return findings. Absence of anything to
    /// report is still data: modules emit an INFO finding rather than
    /// nothing when the check ran cleanly.
    fn inspect(&self, sample: &ImageSample) -> VeriteResult<Vec<ForensicFinding>>;
}

/// Build all forensic modules in the fixed order the log renders them
pub fn build_forensic_modules(config: &VeriteConfig) -> Vec<Arc<dyn ForensicModule>> {
    vec![
        Arc::new(MetadataInspector::new()),
        Arc::new(CompressionAnomalyScorer::new(
            config.ela_quality,
            config.ela_critical_threshold,
        )),
        Arc::new(FaceGeometryValidator::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_order_matches_category_order() {
        let modules = build_forensic_modules(&VeriteConfig::default());
        let categories: Vec<_> = modules.iter().map(|m| m.category()).collect();
        assert_eq!(categories, FindingCategory::ORDERED.to_vec());
    }
}
