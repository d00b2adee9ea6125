//! Face geometry validation: landmark-proportion plausibility checks on
//! the most prominent face.
//!
//! Face localization is handcrafted: skin-tone segmentation over a coarse
//! cell grid, then the largest 4-connected skin region is taken as the
//! face. When several faces are present, only the largest region is
//! evaluated; the others are ignored. Landmark proxies come from
//! luminance minima inside the face box (eye and mouth bands read darker
//! than surrounding skin). Absence of a face is data, not an error and
//! not a signal of fakery.

use crate::config::VeriteConfig;
use crate::ingest::ImageSample;
use crate::signal::{FindingCategory, ForensicFinding, Severity};
use crate::VeriteResult;
use image::{Rgb, RgbImage};

use super::ForensicModule;

const MODULE_ID: &str = "geometry-validator";

/// Cells per axis for the skin-segmentation grid
const GRID: u32 = 64;

// ─── Validator ──────────────────────────────────────────────────────

pub struct FaceGeometryValidator {
    eye_line_bounds: (f64, f64),
    eye_mouth_bounds: (f64, f64),
    eye_asymmetry_limit: f64,
    min_face_fraction: f64,
}

impl FaceGeometryValidator {
    pub fn new(config: &VeriteConfig) -> Self {
        Self {
            eye_line_bounds: config.eye_line_bounds,
            eye_mouth_bounds: config.eye_mouth_bounds,
            eye_asymmetry_limit: config.eye_asymmetry_limit,
            min_face_fraction: config.min_face_fraction,
        }
    }
}

/// Pixel-space bounding box of the detected face, half-open on the right/bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceBox {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl FaceBox {
    fn width(&self) -> u32 {
        self.x1 - self.x0
    }
    fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Copy)]
struct FaceMetrics {
    eye_line_ratio: f64,
    eye_mouth_ratio: f64,
    eye_asymmetry: f64,
}

/// Classic RGB skin-tone rule; deliberately permissive, the grid vote
/// below absorbs the false positives
fn is_skin(px: &Rgb<u8>) -> bool {
    let [r, g, b] = px.0;
    let (ri, gi, bi) = (i16::from(r), i16::from(g), i16::from(b));
    let max = ri.max(gi).max(bi);
    let min = ri.min(gi).min(bi);
    r > 95 && g > 40 && b > 20 && ri > gi && ri > bi && (ri - gi).abs() > 15 && (max - min) > 15
}

fn luminance(px: &Rgb<u8>) -> f64 {
    let [r, g, b] = px.0;
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

impl FaceGeometryValidator {
    /// Locate the largest skin region. Returns `None` when no region covers
    /// at least `min_face_fraction` of the frame.
    fn locate_face(&self, pixels: &RgbImage) -> Option<FaceBox> {
        let (w, h) = pixels.dimensions();
        let cols = GRID.min(w).max(1);
        let rows = GRID.min(h).max(1);
        let cell_w = (w + cols - 1) / cols;
        let cell_h = (h + rows - 1) / rows;

        let mut skin_counts = vec![0u32; (cols * rows) as usize];
        let mut totals = vec![0u32; (cols * rows) as usize];
        for (x, y, px) in pixels.enumerate_pixels() {
            let idx = ((y / cell_h) * cols + x / cell_w) as usize;
            totals[idx] += 1;
            if is_skin(px) {
                skin_counts[idx] += 1;
            }
        }

        let mask: Vec<bool> = skin_counts
            .iter()
            .zip(totals.iter())
            .map(|(&s, &t)| t > 0 && s * 2 >= t)
            .collect();

        // Largest 4-connected component over the cell mask
        let mut visited = vec![false; mask.len()];
        let mut best: Option<(usize, u32, u32, u32, u32)> = None; // (count, cx0, cy0, cx1, cy1)
        for start in 0..mask.len() {
            if !mask[start] || visited[start] {
                continue;
            }
            let mut stack = vec![start];
            visited[start] = true;
            let (mut count, mut cx0, mut cy0, mut cx1, mut cy1) =
                (0usize, cols - 1, rows - 1, 0u32, 0u32);
            while let Some(idx) = stack.pop() {
                count += 1;
                let cx = idx as u32 % cols;
                let cy = idx as u32 / cols;
                cx0 = cx0.min(cx);
                cy0 = cy0.min(cy);
                cx1 = cx1.max(cx);
                cy1 = cy1.max(cy);

                let neighbors = [
                    (cx > 0).then(|| idx - 1),
                    (cx + 1 < cols).then(|| idx + 1),
                    (cy > 0).then(|| idx - cols as usize),
                    (cy + 1 < rows).then(|| idx + cols as usize),
                ];
                for n in neighbors.into_iter().flatten() {
                    if mask[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
            if best.map_or(true, |(c, ..)| count > c) {
                best = Some((count, cx0, cy0, cx1, cy1));
            }
        }

        let (count, cx0, cy0, cx1, cy1) = best?;
        let covered = count as f64 * f64::from(cell_w) * f64::from(cell_h);
        if covered / (f64::from(w) * f64::from(h)) < self.min_face_fraction {
            return None;
        }

        Some(FaceBox {
            x0: cx0 * cell_w,
            y0: cy0 * cell_h,
            x1: ((cx1 + 1) * cell_w).min(w),
            y1: ((cy1 + 1) * cell_h).min(h),
        })
    }

    /// Derive landmark proxies from luminance structure inside the face box
    fn measure(&self, pixels: &RgbImage, face: &FaceBox) -> FaceMetrics {
        let face_h = face.height().max(1);
        let face_w = face.width().max(1);

        let row_means: Vec<f64> = (face.y0..face.y1)
            .map(|y| {
                let sum: f64 = (face.x0..face.x1)
                    .map(|x| luminance(pixels.get_pixel(x, y)))
                    .sum();
                sum / f64::from(face_w)
            })
            .collect();

        // Center of the darkest run of rows within a band, not its first
        // row: features span several rows and the band must sit on them
        let darkest_row = |from_frac: f64, to_frac: f64| -> u32 {
            let lo = (f64::from(face_h) * from_frac) as usize;
            let hi = ((f64::from(face_h) * to_frac) as usize).min(row_means.len() - 1);
            let min_lum = row_means[lo..=hi]
                .iter()
                .fold(f64::MAX, |acc, &l| acc.min(l));
            let (sum, n) = (lo..=hi)
                .filter(|&y| row_means[y] <= min_lum + 0.5)
                .fold((0u64, 0u64), |(s, n), y| (s + y as u64, n + 1));
            face.y0 + (sum / n.max(1)) as u32
        };

        let eye_row = darkest_row(0.05, 0.55);
        let mouth_row = darkest_row(0.55, 0.95);

        // Left/right luminance balance in a band around the eye row
        let band = (face_h / 24).max(1);
        let band_lo = eye_row.saturating_sub(band).max(face.y0);
        let band_hi = (eye_row + band).min(face.y1 - 1);
        let mid_x = face.x0 + face_w / 2;
        let half_mean = |x_from: u32, x_to: u32| -> f64 {
            let mut sum = 0.0;
            let mut n = 0u32;
            for y in band_lo..=band_hi {
                for x in x_from..x_to {
                    sum += luminance(pixels.get_pixel(x, y));
                    n += 1;
                }
            }
            if n == 0 {
                0.0
            } else {
                sum / f64::from(n)
            }
        };
        let left = half_mean(face.x0, mid_x);
        let right = half_mean(mid_x, face.x1);

        FaceMetrics {
            eye_line_ratio: f64::from(eye_row - face.y0) / f64::from(face_h),
            eye_mouth_ratio: f64::from(mouth_row.saturating_sub(eye_row)) / f64::from(face_h),
            eye_asymmetry: (left - right).abs() / 255.0,
        }
    }

    fn violations(&self, m: &FaceMetrics) -> Vec<String> {
        let mut out = Vec::new();
        let (lo, hi) = self.eye_line_bounds;
        if m.eye_line_ratio < lo || m.eye_line_ratio > hi {
            out.push(format!(
                "eye line at {:.2} of face height (plausible {:.2}-{:.2})",
                m.eye_line_ratio, lo, hi
            ));
        }
        let (lo, hi) = self.eye_mouth_bounds;
        if m.eye_mouth_ratio < lo || m.eye_mouth_ratio > hi {
            out.push(format!(
                "eye-to-mouth separation {:.2} of face height (plausible {:.2}-{:.2})",
                m.eye_mouth_ratio, lo, hi
            ));
        }
        if m.eye_asymmetry > self.eye_asymmetry_limit {
            out.push(format!(
                "left/right eye asymmetry {:.2} (limit {:.2})",
                m.eye_asymmetry, self.eye_asymmetry_limit
            ));
        }
        out
    }
}

impl ForensicModule for FaceGeometryValidator {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::Geometry
    }

    fn inspect(&self, sample: &ImageSample) -> VeriteResult<Vec<ForensicFinding>> {
        let pixels = sample.pixels();

        let face = match self.locate_face(pixels) {
            Some(face) => face,
            None => {
                return Ok(vec![ForensicFinding::new(
                    MODULE_ID,
                    FindingCategory::Geometry,
                    Severity::Info,
                    "no face present in frame",
                )]);
            }
        };

        let metrics = self.measure(pixels, &face);
        tracing::debug!(
            "face {}x{} at ({},{}): eye {:.2}, eye-mouth {:.2}, asym {:.2}",
            face.width(),
            face.height(),
            face.x0,
            face.y0,
            metrics.eye_line_ratio,
            metrics.eye_mouth_ratio,
            metrics.eye_asymmetry
        );

        let violations = self.violations(&metrics);
        let finding = match violations.len() {
            0 => ForensicFinding::new(
                MODULE_ID,
                FindingCategory::Geometry,
                Severity::Info,
                "facial geometry within anatomical bounds (most prominent face)",
            ),
            1 => ForensicFinding::new(
                MODULE_ID,
                FindingCategory::Geometry,
                Severity::Warning,
                format!("implausible facial geometry: {}", violations[0]),
            ),
            _ => ForensicFinding::new(
                MODULE_ID,
                FindingCategory::Geometry,
                Severity::Critical,
                format!("implausible facial geometry: {}", violations.join("; ")),
            ),
        };

        Ok(vec![finding])
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
