//! Classifier agents: uniform suspicion-score adapters over heterogeneous
//! image-classification backends.
//!
//! The ensemble carries two specialists with non-overlapping blind spots:
//! a face-swap hunter and a synthetic-imagery hunter. Each backend returns
//! whatever label vocabulary its underlying model was trained with; the
//! adapter normalizes that into a fake-probability and a tagged
//! [`AgentResult`]. An agent never raises: backend errors degrade to
//! `label: Failed` with an error code.

use crate::config::VeriteConfig;
use crate::ingest::ImageSample;
use crate::signal::{AgentLabel, AgentResult};
use std::sync::Arc;
use thiserror::Error;

// ─── Backend Contract ───────────────────────────────────────────────

/// One raw class prediction from a backend model
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPrediction {
    pub label: String,
    pub score: f32,
}

impl ClassPrediction {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
        }
    }
}

/// Failure modes of a classifier backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}

impl BackendError {
    /// Stable error code carried into the analysis log
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelUnavailable(_) => "model-unavailable",
            Self::Inference(_) => "inference-error",
            Self::MalformedOutput(_) => "malformed-output",
        }
    }
}

/// The seam through which model inference enters the pipeline.
///
/// Implementations wrap a process-wide model handle: loaded once at
/// startup, shared read-only across concurrent requests, never reloaded
/// per request. Weight loading and device selection live behind this
/// trait, outside the core.
pub trait ClassifierBackend: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &str;

    /// Run inference on the decoded sample and return raw class predictions
    fn classify(&self, sample: &ImageSample) -> Result<Vec<ClassPrediction>, BackendError>;
}

/// The two process-wide backend handles the ensemble is built from
#[derive(Clone)]
pub struct AgentBackends {
    pub swap: Arc<dyn ClassifierBackend>,
    pub synthesis: Arc<dyn ClassifierBackend>,
}

// ─── Score Normalization ────────────────────────────────────────────

const FAKE_LABELS: [&str; 4] = ["fake", "deepfake", "artificial", "label_1"];
const REAL_LABELS: [&str; 3] = ["real", "natural", "label_0"];

/// Extract the fake-probability from a prediction set regardless of the
/// backend's label vocabulary.
///
/// A fake-flavored label contributes its score directly; a real-flavored
/// label contributes its complement, but only when no fake-flavored
/// prediction was seen first.
pub fn fake_probability(predictions: &[ClassPrediction]) -> f64 {
    let mut fake_score: f64 = 0.0;
    for pred in predictions {
        let label = pred.label.to_lowercase();
        let score = f64::from(pred.score);

        if FAKE_LABELS.contains(&label.as_str()) {
            fake_score = score;
        } else if REAL_LABELS.contains(&label.as_str()) && fake_score == 0.0 {
            fake_score = 1.0 - score;
        }
    }
    fake_score.clamp(0.0, 1.0)
}

// ─── Classifier Agent ───────────────────────────────────────────────

/// A wrapped classifier exposing the uniform suspicion-score contract
pub struct ClassifierAgent {
    id: &'static str,
    display_name: &'static str,
    backend: Arc<dyn ClassifierBackend>,
    suspicion_threshold: f64,
}

impl ClassifierAgent {
    pub fn new(
        id: &'static str,
        display_name: &'static str,
        backend: Arc<dyn ClassifierBackend>,
        suspicion_threshold: f64,
    ) -> Self {
        Self {
            id,
            display_name,
            backend,
            suspicion_threshold,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// Evaluate one sample. Never raises: backend failures are folded into
    /// the returned result as `label: Failed`.
    pub fn evaluate(&self, sample: &ImageSample) -> AgentResult {
        match self.backend.classify(sample) {
            Ok(predictions) if predictions.is_empty() => {
                tracing::warn!("{}: backend returned no predictions", self.id);
                AgentResult::failed(self.id, self.display_name, "malformed-output")
            }
            Ok(predictions) => {
                let score = fake_probability(&predictions);
                let label = if score >= self.suspicion_threshold {
                    AgentLabel::Suspicious
                } else {
                    AgentLabel::Clean
                };
                tracing::debug!("{}: suspicion {:.4} ({})", self.id, score, label);
                AgentResult {
                    agent_id: self.id.to_string(),
                    display_name: self.display_name.to_string(),
                    suspicion_score: score,
                    label,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("{}: backend error: {}", self.id, e);
                AgentResult::failed(self.id, self.display_name, e.code())
            }
        }
    }
}

/// Build the ensemble in its fixed declaration order
pub fn build_agents(backends: &AgentBackends, config: &VeriteConfig) -> Vec<Arc<ClassifierAgent>> {
    vec![
        Arc::new(ClassifierAgent::new(
            "swap-hunter",
            "Vigilante-V2",
            Arc::clone(&backends.swap),
            config.agent_suspicion_threshold,
        )),
        Arc::new(ClassifierAgent::new(
            "synthesis-hunter",
            "Sentinel-X",
            Arc::clone(&backends.synthesis),
            config.agent_suspicion_threshold,
        )),
    ]
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};

    struct FixedBackend(Vec<ClassPrediction>);

    impl ClassifierBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }
        fn classify(&self, _: &ImageSample) -> Result<Vec<ClassPrediction>, BackendError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenBackend;

    impl ClassifierBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }
        fn classify(&self, _: &ImageSample) -> Result<Vec<ClassPrediction>, BackendError> {
            Err(BackendError::ModelUnavailable("weights missing".into()))
        }
    }

    fn sample() -> ImageSample {
        let img = RgbImage::from_pixel(32, 32, image::Rgb([128, 128, 128]));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), 32, 32, image::ColorType::Rgb8)
            .unwrap();
        ImageSample::decode(&buf, 1024).unwrap()
    }

    #[test]
    fn test_fake_label_scores_directly() {
        let preds = vec![
            ClassPrediction::new("Fake", 0.85),
            ClassPrediction::new("Real", 0.15),
        ];
        assert!((fake_probability(&preds) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_real_only_vocabulary_is_complemented() {
        let preds = vec![ClassPrediction::new("real", 0.9)];
        assert!((fake_probability(&preds) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_real_label_does_not_override_fake_score() {
        // Once a fake-flavored score is seen, a later real-flavored
        // prediction must not replace it
        let preds = vec![
            ClassPrediction::new("deepfake", 0.7),
            ClassPrediction::new("natural", 0.95),
        ];
        assert!((fake_probability(&preds) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_index_style_labels() {
        let preds = vec![
            ClassPrediction::new("LABEL_0", 0.2),
            ClassPrediction::new("LABEL_1", 0.8),
        ];
        assert!((fake_probability(&preds) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_labels_score_zero() {
        let preds = vec![ClassPrediction::new("cat", 0.99)];
        assert_eq!(fake_probability(&preds), 0.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let preds = vec![ClassPrediction::new("fake", 1.5)];
        assert_eq!(fake_probability(&preds), 1.0);
    }

    #[test]
    fn test_agent_labels_suspicious_at_threshold() {
        let agent = ClassifierAgent::new(
            "a",
            "A",
            Arc::new(FixedBackend(vec![ClassPrediction::new("fake", 0.5)])),
            0.5,
        );
        let result = agent.evaluate(&sample());
        assert_eq!(result.label, AgentLabel::Suspicious);
    }

    #[test]
    fn test_agent_labels_clean_below_threshold() {
        let agent = ClassifierAgent::new(
            "a",
            "A",
            Arc::new(FixedBackend(vec![ClassPrediction::new("fake", 0.49)])),
            0.5,
        );
        let result = agent.evaluate(&sample());
        assert_eq!(result.label, AgentLabel::Clean);
        assert!((result.suspicion_score - 0.49).abs() < 1e-6);
    }

    #[test]
    fn test_backend_error_degrades_to_failed() {
        let agent = ClassifierAgent::new("a", "A", Arc::new(BrokenBackend), 0.5);
        let result = agent.evaluate(&sample());
        assert_eq!(result.label, AgentLabel::Failed);
        assert_eq!(result.error.as_deref(), Some("model-unavailable"));
    }

    #[test]
    fn test_empty_prediction_set_is_malformed() {
        let agent = ClassifierAgent::new("a", "A", Arc::new(FixedBackend(vec![])), 0.5);
        let result = agent.evaluate(&sample());
        assert_eq!(result.label, AgentLabel::Failed);
        assert_eq!(result.error.as_deref(), Some("malformed-output"));
    }
}
