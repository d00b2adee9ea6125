//! Engine configuration: every threshold the pipeline consults is an
//! explicit field here, never a buried constant.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeriteConfig {
    /// Suspicion score at or above which an agent labels the image SUSPICIOUS
    pub agent_suspicion_threshold: f64,
    /// JPEG quality used for the error-level-analysis re-encode
    pub ela_quality: u8,
    /// ELA score (0-100 scale) at or above which the compression module
    /// emits a CRITICAL finding
    pub ela_critical_threshold: f64,
    /// Maximum image dimension; larger inputs are downscaled, never rejected
    pub max_dimension: u32,
    /// Per-agent inference budget in milliseconds
    pub agent_timeout_ms: u64,
    /// Overall fan-out deadline in milliseconds
    pub overall_deadline_ms: u64,
    /// Plausible range for the eye line, as a fraction of face height
    pub eye_line_bounds: (f64, f64),
    /// Plausible range for eye-to-mouth separation, as a fraction of face height
    pub eye_mouth_bounds: (f64, f64),
    /// Maximum tolerated left/right eye luminance asymmetry
    pub eye_asymmetry_limit: f64,
    /// Minimum fraction of the frame a skin region must cover to count as a face
    pub min_face_fraction: f64,
}

impl Default for VeriteConfig {
    fn default() -> Self {
        Self {
            agent_suspicion_threshold: 0.5,
            ela_quality: 75,
            ela_critical_threshold: 15.0,
            max_dimension: 1024,
            agent_timeout_ms: 5_000,
            overall_deadline_ms: 10_000,
            eye_line_bounds: (0.18, 0.52),
            eye_mouth_bounds: (0.25, 0.62),
            eye_asymmetry_limit: 0.28,
            min_face_fraction: 0.02,
        }
    }
}

impl VeriteConfig {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let cfg = VeriteConfig::default();
        assert_eq!(cfg.agent_suspicion_threshold, 0.5);
        assert_eq!(cfg.ela_critical_threshold, 15.0);
        assert!(cfg.agent_timeout() < cfg.overall_deadline());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = VeriteConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: VeriteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_dimension, cfg.max_dimension);
        assert_eq!(back.eye_line_bounds, cfg.eye_line_bounds);
    }
}
