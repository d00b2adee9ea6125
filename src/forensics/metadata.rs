//! Metadata inspection: editing-software and AI-generator signatures in
//! embedded image metadata.
//!
//! Works directly on the retained encoded bytes, scanning EXIF/XMP text
//! the same way regardless of container format. Absence of metadata is
//! data, not an error: many legitimate pipelines strip tags on re-encode.

use crate::ingest::ImageSample;
use crate::signal::{FindingCategory, ForensicFinding, Severity};
use crate::VeriteResult;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ForensicModule;

const MODULE_ID: &str = "metadata-inspector";

// ─── Signature Tables ───────────────────────────────────────────────

/// Raster editors whose software tags mark post-processing
static EDITOR_SIGNATURES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)adobe\s+photoshop", "Adobe Photoshop"),
        (r"(?i)\bGIMP\b", "GIMP"),
        (r"(?i)adobe\s+lightroom|\blightroom\b", "Adobe Lightroom"),
        (r"(?i)affinity\s+photo", "Affinity Photo"),
        (r"(?i)pixelmator", "Pixelmator"),
        (r"(?i)paint\.net", "Paint.NET"),
        (r"(?i)corel\s*(?:draw|photo-paint)", "Corel"),
    ]
    .iter()
    .map(|&(pat, tool)| (Regex::new(pat).unwrap(), tool))
    .collect()
});

/// Generative tools and provenance markers that flag synthetic origin
static AI_SIGNATURES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)midjourney", "Midjourney"),
        (r"(?i)dall[-·]?e", "DALL-E"),
        (r"(?i)stable\s*diffusion", "Stable Diffusion"),
        (r"(?i)adobe\s+firefly", "Adobe Firefly"),
        (r"(?i)leonardo\.?ai", "Leonardo.Ai"),
        // IPTC digital source type for fully AI-generated media
        (r"trainedAlgorithmicMedia", "AI-generated (IPTC source type)"),
        (r"(?i)generated\s+by\s+ai|ai[-\s]generated", "AI-generated (text marker)"),
    ]
    .iter()
    .map(|&(pat, tool)| (Regex::new(pat).unwrap(), tool))
    .collect()
});

/// Byte markers whose presence means embedded metadata exists at all
const METADATA_MARKERS: [&[u8]; 6] = [
    b"Exif",
    b"<x:xmpmeta",
    b"http://ns.adobe.com/xap/1.0/",
    b"tEXt",
    b"iTXt",
    b"8BIM", // Photoshop IRB segment
];

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ─── Inspector ──────────────────────────────────────────────────────

pub struct MetadataInspector;

impl MetadataInspector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ForensicModule for MetadataInspector {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::Metadata
    }

    fn inspect(&self, sample: &ImageSample) -> VeriteResult<Vec<ForensicFinding>> {
        let bytes = sample.encoded();
        let text = String::from_utf8_lossy(bytes);
        let mut findings = Vec::new();

        for (re, tool) in AI_SIGNATURES.iter() {
            if re.is_match(&text) {
                findings.push(ForensicFinding::new(
                    MODULE_ID,
                    FindingCategory::Metadata,
                    Severity::Critical,
                    format!("AI generation signature in metadata: {}", tool),
                ));
            }
        }

        for (re, tool) in EDITOR_SIGNATURES.iter() {
            if re.is_match(&text) {
                findings.push(ForensicFinding::new(
                    MODULE_ID,
                    FindingCategory::Metadata,
                    Severity::Warning,
                    format!("editing software signature in metadata: {}", tool),
                ));
            }
        }

        if findings.is_empty() {
            let has_metadata = METADATA_MARKERS
                .iter()
                .any(|marker| contains_bytes(bytes, marker));
            if has_metadata {
                findings.push(ForensicFinding::new(
                    MODULE_ID,
                    FindingCategory::Metadata,
                    Severity::Info,
                    "embedded metadata present, no editing signatures",
                ));
            } else {
                findings.push(ForensicFinding::new(
                    MODULE_ID,
                    FindingCategory::Metadata,
                    Severity::Info,
                    "no embedded metadata (common after legitimate re-encoding)",
                ));
            }
        }

        Ok(findings)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
