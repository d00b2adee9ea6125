//! # verite: Image Authenticity Forensics Engine
//!
//! Classifies a single submitted image as genuine or manipulated by fusing
//! signals from independent detectors into one verdict with a human-readable
//! rationale.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VeriteEngine                           │
//! │  ┌───────────┐ ┌──────────────┐ ┌──────────────────────┐   │
//! │  │ImageSample│ │SignalCollector│ │ Classifier Backends │   │
//! │  │(1 decode) │ │(parallel)     │ │(process-wide handles)│  │
//! │  └─────┬─────┘ └──────┬───────┘ └──────────┬───────────┘   │
//! │        │              │                    │                │
//! │  ┌─────▼──────────────▼────────────────────▼─────────────┐  │
//! │  │  2 Classifier Agents + 3 Forensic Modules (rayon)     │  │
//! │  │  Swap │ Synthesis │ Metadata │ Compression │ Geometry │  │
//! │  └──────────────────────────┬────────────────────────────┘  │
//! │                             │                               │
//! │  ┌──────────────────────────▼────────────────────────────┐  │
//! │  │  SignalBundle → Verdict Aggregation → Analysis Log    │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capabilities
//!
//! - **Classifier Ensemble**: two specialist agents (face swaps, synthetic
//!   imagery) behind a uniform suspicion-score contract
//! - **Metadata Inspection**: editing-software and AI-generator signature
//!   detection in embedded EXIF/XMP metadata
//! - **Error-Level Analysis**: compression-error anomaly scoring against a
//!   deterministic re-encode
//! - **Face Geometry Validation**: landmark-proportion plausibility checks
//!   on the most prominent face
//! - **Deadline-Bounded Fan-Out**: every detector runs in parallel, isolated
//!   from its siblings' failures
//! - **Explainable Verdicts**: deterministic, stably-ordered analysis log
//!   listing every signal, including degraded ones

pub mod agents;
pub mod collector;
pub mod config;
pub mod engine;
pub mod forensics;
pub mod ingest;
pub mod report;
pub mod signal;
pub mod verdict;

// Re-exports for convenience
pub use agents::{AgentBackends, ClassPrediction, ClassifierAgent, ClassifierBackend};
pub use config::VeriteConfig;
pub use engine::VeriteEngine;
pub use ingest::{ImageFormatTag, ImageSample};
pub use report::AnalysisReport;
pub use signal::{AgentLabel, AgentResult, FindingCategory, ForensicFinding, Severity, SignalBundle};
pub use verdict::Verdict;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeriteError {
    /// The submitted bytes could not be decoded as an image. Surfaced to the
    /// transport layer before any detector runs.
    #[error("undecodable image: {0}")]
    UndecodableImage(String),

    /// Video ingestion is a reserved boundary; only still frames are accepted.
    #[error("video ingestion not implemented: {0}")]
    VideoUnsupported(String),

    /// Internal failure of a forensic module. Recovered at the fan-out
    /// boundary; never reaches the caller of `analyze`.
    #[error("forensic module error: {0}")]
    Forensic(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type VeriteResult<T> = Result<T, VeriteError>;
