//! Verdict aggregation: the deterministic fusion rule turning a frozen
//! [`SignalBundle`] into one verdict and confidence figure.
//!
//! The rule trusts the single most suspicious signal (maximum over agent
//! scores, any CRITICAL forensic finding overrides). Averaging would let
//! one confident specialist be diluted by the others, so it is
//! deliberately not used. Fusion is commutative over the bundle: arrival
//! order never matters.

use crate::config::VeriteConfig;
use crate::signal::SignalBundle;
use serde::{Deserialize, Serialize};

// ─── Verdict ────────────────────────────────────────────────────────

/// Final categorical decision for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Real,
    Fake,
    /// No detector produced a usable signal
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "REAL"),
            Self::Fake => write!(f, "FAKE"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Aggregated decision plus the signal that decided it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictOutcome {
    pub verdict: Verdict,
    /// Percentage string with two decimals, e.g. "87.50%"
    pub confidence_score: String,
    /// Id of the decisive agent or module, when one exists
    pub decisive_signal: Option<String>,
}

/// Format a [0, 1] suspicion score as the boundary percentage string
pub fn format_confidence(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

// ─── Fusion Rule ────────────────────────────────────────────────────

/// Apply the fusion rule. Pure function of the bundle and configuration.
pub fn aggregate(bundle: &SignalBundle, config: &VeriteConfig) -> VerdictOutcome {
    let max_agent = bundle
        .agent_results
        .iter()
        .filter(|r| r.succeeded())
        .max_by(|a, b| {
            a.suspicion_score
                .partial_cmp(&b.suspicion_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let critical = bundle.top_critical_finding();

    // Total failure: no classifier signal and nothing above INFO from the
    // forensic side. INFO findings are observations, not signals, so a
    // bundle of failed agents plus routine INFO lines still maps to ERROR.
    if max_agent.is_none() && !bundle.has_signal_findings() {
        return VerdictOutcome {
            verdict: Verdict::Error,
            confidence_score: format_confidence(0.0),
            decisive_signal: None,
        };
    }

    let agent_score = max_agent.map(|r| r.suspicion_score);
    let is_fake = agent_score.map_or(false, |s| s >= config.agent_suspicion_threshold)
        || critical.is_some();

    // Confidence comes from the decisive signal: the top agent when any
    // succeeded, else the top critical finding's own 0-100 score
    let (confidence_score, decisive_signal) = match (max_agent, critical) {
        (Some(agent), _) => (
            format_confidence(agent.suspicion_score),
            Some(agent.agent_id.clone()),
        ),
        (None, Some(finding)) => (
            format!("{:.2}%", finding.score.unwrap_or(0.0)),
            Some(finding.module_id.clone()),
        ),
        (None, None) => (format_confidence(0.0), None),
    };

    VerdictOutcome {
        verdict: if is_fake { Verdict::Fake } else { Verdict::Real },
        confidence_score,
        decisive_signal,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
