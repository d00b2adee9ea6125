//! Signal taxonomy: the common space every detector's output is
//! normalized into before fusion.
//!
//! Classifier agents produce an [`AgentResult`] apiece; forensic modules
//! produce zero or more [`ForensicFinding`]s. The collector freezes them
//! into a [`SignalBundle`], the sole input to verdict aggregation.

use serde::{Deserialize, Serialize};

// ─── Severity ───────────────────────────────────────────────────────

/// Severity of a forensic finding, ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Observation only; carries no weight toward the verdict
    Info,
    /// Suspicious but not decisive on its own
    Warning,
    /// Overrides classifier scores: the verdict becomes FAKE
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ─── Finding Category ───────────────────────────────────────────────

/// Which forensic discipline produced a finding. Also fixes the rendering
/// order of the forensic section of the analysis log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingCategory {
    Metadata,
    Compression,
    Geometry,
}

impl FindingCategory {
    /// Fixed module order used everywhere a deterministic sequence is needed
    pub const ORDERED: [FindingCategory; 3] = [
        FindingCategory::Metadata,
        FindingCategory::Compression,
        FindingCategory::Geometry,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Compression => "compression",
            Self::Geometry => "geometry",
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ─── Forensic Finding ───────────────────────────────────────────────

/// A single forensic observation, independent of classifier scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicFinding {
    /// Id of the module that emitted the finding
    pub module_id: String,
    pub category: FindingCategory,
    pub severity: Severity,
    /// Single-line, self-contained description
    pub message: String,
    /// Numeric score on a 0-100 scale, where the module computes one
    pub score: Option<f64>,
}

impl ForensicFinding {
    pub fn new(
        module_id: &str,
        category: FindingCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            module_id: module_id.to_string(),
            category,
            severity,
            message: message.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

// ─── Agent Result ───────────────────────────────────────────────────

/// Outcome label of one classifier agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentLabel {
    /// Score at or above the agent's suspicion threshold
    Suspicious,
    /// Score below the threshold
    Clean,
    /// The agent could not produce a score; carries an error code
    Failed,
}

impl std::fmt::Display for AgentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suspicious => write!(f, "SUSPICIOUS"),
            Self::Clean => write!(f, "CLEAN"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Normalized output of one classifier agent for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: String,
    /// Human display name carried through to the analysis log
    pub display_name: String,
    /// Estimated likelihood of manipulation, always in [0, 1].
    /// Meaningless when `label` is `Failed`.
    pub suspicion_score: f64,
    pub label: AgentLabel,
    /// Error code when `label` is `Failed`
    pub error: Option<String>,
}

impl AgentResult {
    pub fn succeeded(&self) -> bool {
        self.label != AgentLabel::Failed
    }

    pub fn failed(agent_id: &str, display_name: &str, error: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            display_name: display_name.to_string(),
            suspicion_score: 0.0,
            label: AgentLabel::Failed,
            error: Some(error.into()),
        }
    }
}

// ─── Skipped Components ─────────────────────────────────────────────

/// Why a forensic module contributed nothing to the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    TimedOut,
    Panicked,
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out"),
            Self::Panicked => write!(f, "panicked"),
            Self::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Failure marker for a forensic module, kept so the bundle stays complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedComponent {
    pub component_id: String,
    pub reason: SkipReason,
}

// ─── Signal Bundle ──────────────────────────────────────────────────

/// Everything the detectors produced for one invocation.
///
/// Built by the collector, frozen before aggregation. Completeness
/// invariant: one `AgentResult` per configured agent (Failed markers
/// included) and, for every forensic module, either its findings or a
/// `SkippedComponent` entry. Nothing is discarded silently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalBundle {
    /// One entry per agent, in fixed declaration order
    pub agent_results: Vec<AgentResult>,
    /// Findings in fixed module order, emission order preserved within a module
    pub findings: Vec<ForensicFinding>,
    /// Modules that produced nothing, with the reason
    pub skipped: Vec<SkippedComponent>,
}

impl SignalBundle {
    /// Maximum suspicion score among agents that succeeded, if any did
    pub fn max_agent_score(&self) -> Option<f64> {
        self.agent_results
            .iter()
            .filter(|r| r.succeeded())
            .map(|r| r.suspicion_score)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f64| a.max(s))))
    }

    /// Highest-scoring CRITICAL finding, if any
    pub fn top_critical_finding(&self) -> Option<&ForensicFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .max_by(|a, b| {
                a.score
                    .unwrap_or(0.0)
                    .partial_cmp(&b.score.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// True if any finding rises above INFO
    pub fn has_signal_findings(&self) -> bool {
        self.findings.iter().any(|f| f.severity > Severity::Info)
    }

    pub fn findings_in_category(&self, category: FindingCategory) -> Vec<&ForensicFinding> {
        self.findings
            .iter()
            .filter(|f| f.category == category)
            .collect()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, score: f64, label: AgentLabel) -> AgentResult {
        AgentResult {
            agent_id: id.to_string(),
            display_name: id.to_string(),
            suspicion_score: score,
            label,
            error: None,
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_max_agent_score_ignores_failed() {
        let bundle = SignalBundle {
            agent_results: vec![
                agent("a", 0.9, AgentLabel::Suspicious),
                AgentResult::failed("b", "b", "timeout"),
            ],
            ..Default::default()
        };
        assert_eq!(bundle.max_agent_score(), Some(0.9));
    }

    #[test]
    fn test_max_agent_score_none_when_all_failed() {
        let bundle = SignalBundle {
            agent_results: vec![
                AgentResult::failed("a", "a", "timeout"),
                AgentResult::failed("b", "b", "model-unavailable"),
            ],
            ..Default::default()
        };
        assert_eq!(bundle.max_agent_score(), None);
    }

    #[test]
    fn test_top_critical_picks_highest_score() {
        let bundle = SignalBundle {
            findings: vec![
                ForensicFinding::new("ela", FindingCategory::Compression, Severity::Critical, "a")
                    .with_score(18.3),
                ForensicFinding::new("meta", FindingCategory::Metadata, Severity::Critical, "b")
                    .with_score(40.0),
                ForensicFinding::new("geo", FindingCategory::Geometry, Severity::Info, "c"),
            ],
            ..Default::default()
        };
        assert_eq!(bundle.top_critical_finding().unwrap().module_id, "meta");
    }

    #[test]
    fn test_info_findings_are_not_signal() {
        let bundle = SignalBundle {
            findings: vec![ForensicFinding::new(
                "geo",
                FindingCategory::Geometry,
                Severity::Info,
                "no face present",
            )],
            ..Default::default()
        };
        assert!(!bundle.has_signal_findings());
    }
}
