//! Analysis reporting: the ordered, stably-formatted log and the JSON
//! boundary representation.
//!
//! Rendering is deterministic and idempotent: agents appear first in
//! declaration order, then forensic findings grouped by category in fixed
//! module order, so identical bundles always produce byte-identical text.
//! Every forensic line carries a leading `•` marker and is self-contained;
//! the presentation layer splits on newlines and strips the markers.

use crate::signal::{AgentLabel, SignalBundle};
use crate::verdict::{Verdict, VerdictOutcome};
use crate::VeriteResult;
use serde::{Deserialize, Serialize};

// ─── Analysis Report ────────────────────────────────────────────────

/// The only artifact returned to the external boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub verdict: Verdict,
    /// Percentage string with two decimals, e.g. "87.50%"
    pub confidence_score: String,
    /// Ordered analysis log, one self-contained line per entry
    pub analysis: Vec<String>,
    pub elapsed_ms: u64,
    pub engine_version: String,
}

/// Boundary shape consumed by the presentation layer: `analysis` is
/// flattened to one newline-joined string
#[derive(Serialize)]
struct WireReport<'a> {
    verdict: Verdict,
    confidence_score: &'a str,
    analysis: String,
}

impl AnalysisReport {
    /// Serialize to the JSON object the transport layer returns verbatim
    pub fn to_boundary_json(&self) -> VeriteResult<String> {
        let wire = WireReport {
            verdict: self.verdict,
            confidence_score: &self.confidence_score,
            analysis: self.analysis.join("\n"),
        };
        Ok(serde_json::to_string_pretty(&wire)?)
    }
}

// ─── Log Renderer ───────────────────────────────────────────────────

/// Marker prefixed to every forensic line; the presentation layer strips it
const BULLET: &str = "•";

/// Render the ordered analysis log for one bundle
pub fn render_analysis(bundle: &SignalBundle, outcome: &VerdictOutcome) -> Vec<String> {
    let mut lines = Vec::with_capacity(bundle.agent_results.len() + bundle.findings.len() + 4);

    lines.push(format!(
        "Verdict: {} (confidence {})",
        outcome.verdict, outcome.confidence_score
    ));
    if let Some(signal) = &outcome.decisive_signal {
        lines.push(format!("Decisive signal: {}", signal));
    }

    lines.push("Classifier ensemble:".to_string());
    for result in &bundle.agent_results {
        match result.label {
            AgentLabel::Failed => lines.push(format!(
                "  {} ({}): FAILED ({})",
                result.display_name,
                result.agent_id,
                result.error.as_deref().unwrap_or("unknown"),
            )),
            label => lines.push(format!(
                "  {} ({}): suspicion {:.4} [{}]",
                result.display_name, result.agent_id, result.suspicion_score, label,
            )),
        }
    }

    lines.push("Forensic findings:".to_string());
    for category in crate::signal::FindingCategory::ORDERED {
        for finding in bundle.findings_in_category(category) {
            lines.push(format!(
                "{} [{}] {}: {}",
                BULLET, finding.severity, finding.category, finding.message
            ));
        }
    }
    for skipped in &bundle.skipped {
        lines.push(format!(
            "{} [SKIPPED] {}: {}",
            BULLET, skipped.component_id, skipped.reason
        ));
    }

    lines
}

// ─── Tests ──────────────────────────────────────────────────────────
