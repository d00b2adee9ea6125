//! # Verite Engine: Lean Orchestrator
//!
//! One invocation flows through:
//!
//! - `ingest`: fail-fast decode into an immutable shared sample
//! - `collector`: deadline-bounded parallel fan-out over agents + modules
//! - `verdict`: deterministic fusion of the frozen bundle
//! - `report`: stable analysis log + boundary serialization
//!
//! Classifier backends are process-wide handles injected at construction,
//! loaded once and shared read-only across concurrent requests. The engine
//! keeps no per-request state: each invocation's bundle and report are
//! independent and dropped once returned.

use crate::agents::{build_agents, AgentBackends, ClassifierAgent};
use crate::collector::collect_signals;
use crate::config::VeriteConfig;
use crate::forensics::{build_forensic_modules, ForensicModule};
use crate::ingest::ImageSample;
use crate::report::{render_analysis, AnalysisReport};
use crate::verdict::aggregate;
use crate::{VeriteError, VeriteResult};
use std::sync::Arc;
use std::time::Instant;

/// The image authenticity pipeline
pub struct VeriteEngine {
    config: VeriteConfig,
    agents: Vec<Arc<ClassifierAgent>>,
    modules: Vec<Arc<dyn ForensicModule>>,
}

impl VeriteEngine {
    /// Build the engine around the two process-wide classifier handles
    pub fn new(config: VeriteConfig, backends: AgentBackends) -> Self {
        let agents = build_agents(&backends, &config);
        let modules = build_forensic_modules(&config);
        Self {
            config,
            agents,
            modules,
        }
    }

    pub fn config(&self) -> &VeriteConfig {
        &self.config
    }

    /// Analyze one encoded image and return the fused verdict.
    ///
    /// The only error path is undecodable input, surfaced before any
    /// detector runs. Every detector failure past that point degrades into
    /// the returned report; total detector failure is `Verdict::Error`,
    /// still a well-formed report.
    pub fn analyze(&self, image_bytes: &[u8]) -> VeriteResult<AnalysisReport> {
        let start = Instant::now();

        let sample = Arc::new(ImageSample::decode(image_bytes, self.config.max_dimension)?);
        tracing::info!("═══════════════════════════════════════════════════════");
        tracing::info!(
            "verite scan: {} {} bytes, {}x{}, sha256 {}",
            sample.format().display_name(),
            sample.encoded_len(),
            sample.dimensions().0,
            sample.dimensions().1,
            &sample.sha256()[..12]
        );

        let bundle = collect_signals(&self.agents, &self.modules, &sample, &self.config);
        let outcome = aggregate(&bundle, &self.config);
        let analysis = render_analysis(&bundle, &outcome);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "verdict {} (confidence {}) in {}ms",
            outcome.verdict,
            outcome.confidence_score,
            elapsed_ms
        );
        tracing::info!("═══════════════════════════════════════════════════════");

        Ok(AnalysisReport {
            verdict: outcome.verdict,
            confidence_score: outcome.confidence_score,
            analysis,
            elapsed_ms,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Reserved boundary: video ingestion is not implemented. A caller
    /// holding a representative still frame submits it through
    /// [`VeriteEngine::analyze`] instead.
    pub fn analyze_video(&self, url: &str) -> VeriteResult<AnalysisReport> {
        Err(VeriteError::VideoUnsupported(format!(
            "no ingestion path for {}; extract a frame and use analyze",
            url
        )))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{BackendError, ClassPrediction, ClassifierBackend};
    use crate::verdict::Verdict;
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};

    struct FixedBackend(f32);

    impl ClassifierBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }
        fn classify(&self, _: &ImageSample) -> Result<Vec<ClassPrediction>, BackendError> {
            Ok(vec![ClassPrediction::new("fake", self.0)])
        }
    }

    struct UnavailableBackend;

    impl ClassifierBackend for UnavailableBackend {
        fn name(&self) -> &str {
            "unavailable"
        }
        fn classify(&self, _: &ImageSample) -> Result<Vec<ClassPrediction>, BackendError> {
            Err(BackendError::ModelUnavailable("not loaded".into()))
        }
    }

    fn engine(swap: f32, synthesis: f32) -> VeriteEngine {
        VeriteEngine::new(
            VeriteConfig::default(),
            AgentBackends {
                swap: Arc::new(FixedBackend(swap)),
                synthesis: Arc::new(FixedBackend(synthesis)),
            },
        )
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(64, 64, image::Rgb([80, 85, 90]));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), 64, 64, image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    #[test]
    fn test_analyze_returns_well_formed_report() {
        let report = engine(0.9, 0.2).analyze(&png_bytes()).unwrap();
        assert_eq!(report.verdict, Verdict::Fake);
        assert_eq!(report.confidence_score, "90.00%");
        assert!(!report.analysis.is_empty());
        assert_eq!(report.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_undecodable_input_fails_fast() {
        let err = engine(0.5, 0.5).analyze(b"not an image").unwrap_err();
        assert!(matches!(err, VeriteError::UndecodableImage(_)));
    }

    #[test]
    fn test_unavailable_models_still_produce_a_report() {
        let engine = VeriteEngine::new(
            VeriteConfig::default(),
            AgentBackends {
                swap: Arc::new(UnavailableBackend),
                synthesis: Arc::new(UnavailableBackend),
            },
        );
        let report = engine.analyze(&png_bytes()).unwrap();
        // Forensic modules still ran; both agents listed as FAILED
        assert!(report
            .analysis
            .iter()
            .any(|l| l.contains("FAILED (model-unavailable)")));
    }

    #[test]
    fn test_video_boundary_is_reserved() {
        let err = engine(0.5, 0.5)
            .analyze_video("https://example.com/clip.mp4")
            .unwrap_err();
        assert!(matches!(err, VeriteError::VideoUnsupported(_)));
    }
}
