//! Error-level analysis: compare the image against a deterministic JPEG
//! re-encode of itself and score the residual.
//!
//! Splices and locally re-compressed regions leave a different
//! compression-error magnitude than the rest of the frame, so a uniformly
//! processed image scores low while non-uniform processing pushes the
//! mean residual up. The scalar score is a global proxy for "was this
//! image non-uniformly processed".

use crate::ingest::ImageSample;
use crate::signal::{FindingCategory, ForensicFinding, Severity};
use crate::{VeriteError, VeriteResult};
use image::codecs::jpeg::JpegEncoder;

use super::ForensicModule;

const MODULE_ID: &str = "compression-analyzer";

pub struct CompressionAnomalyScorer {
    quality: u8,
    critical_threshold: f64,
}

impl CompressionAnomalyScorer {
    pub fn new(quality: u8, critical_threshold: f64) -> Self {
        Self {
            quality,
            critical_threshold,
        }
    }

    /// Mean absolute per-channel residual against the re-encode, scaled to
    /// [0, 100]. Deterministic: the JPEG encoder has no randomized state.
    pub fn ela_score(&self, sample: &ImageSample) -> VeriteResult<f64> {
        let pixels = sample.pixels();
        let (w, h) = pixels.dimensions();

        let mut reencoded_bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut reencoded_bytes, self.quality);
        encoder
            .encode(pixels.as_raw(), w, h, image::ColorType::Rgb8)
            .map_err(|e| VeriteError::Forensic(format!("ELA re-encode failed: {}", e)))?;

        let reencoded = image::load_from_memory(&reencoded_bytes)
            .map_err(|e| VeriteError::Forensic(format!("ELA re-decode failed: {}", e)))?
            .to_rgb8();

        let original = pixels.as_raw();
        let recompressed = reencoded.as_raw();
        if original.len() != recompressed.len() {
            return Err(VeriteError::Forensic(
                "ELA buffers diverged in size".to_string(),
            ));
        }

        let total: u64 = original
            .iter()
            .zip(recompressed.iter())
            .map(|(a, b)| u64::from(a.abs_diff(*b)))
            .sum();
        let mean = total as f64 / original.len() as f64;
        Ok(mean / 255.0 * 100.0)
    }
}

impl ForensicModule for CompressionAnomalyScorer {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::Compression
    }

    fn inspect(&self, sample: &ImageSample) -> VeriteResult<Vec<ForensicFinding>> {
        let score = self.ela_score(sample)?;
        tracing::debug!("ELA score {:.2} (threshold {:.2})", score, self.critical_threshold);

        let finding = if score >= self.critical_threshold {
            ForensicFinding::new(
                MODULE_ID,
                FindingCategory::Compression,
                Severity::Critical,
                format!(
                    "error-level anomaly score {:.2} above threshold {:.2}",
                    score, self.critical_threshold
                ),
            )
            .with_score(score)
        } else {
            ForensicFinding::new(
                MODULE_ID,
                FindingCategory::Compression,
                Severity::Info,
                format!("compression error level nominal (score {:.2})", score),
            )
            .with_score(score)
        };

        Ok(vec![finding])
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
