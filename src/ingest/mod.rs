//! Input ingestion: one decode per request, producing the immutable
//! [`ImageSample`] every detector reads.

use crate::{VeriteError, VeriteResult};
use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ─── Format Tag ─────────────────────────────────────────────────────

/// Encoded format of the submitted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormatTag {
    Jpeg,
    Png,
    Webp,
    Other,
}

impl ImageFormatTag {
    fn from_guessed(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Jpeg => Self::Jpeg,
            image::ImageFormat::Png => Self::Png,
            image::ImageFormat::WebP => Self::Webp,
            _ => Self::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
            Self::Other => "other",
        }
    }
}

// ─── Image Sample ───────────────────────────────────────────────────

/// An immutable decoded image plus provenance of its encoded form.
///
/// Owned by one pipeline invocation and shared read-only across the
/// fan-out; never mutated after decode. The encoded bytes are retained so
/// the metadata inspector can read embedded tags without a re-encode.
#[derive(Debug, Clone)]
pub struct ImageSample {
    pixels: RgbImage,
    encoded: Vec<u8>,
    format: ImageFormatTag,
    sha256: String,
    original_dimensions: (u32, u32),
}

impl ImageSample {
    /// Decode raw bytes into a sample, downscaling oversized images to
    /// `max_dimension` on the longest side. Oversized input is never
    /// rejected; undecodable input fails fast.
    pub fn decode(bytes: &[u8], max_dimension: u32) -> VeriteResult<Self> {
        let format = image::guess_format(bytes)
            .map(ImageFormatTag::from_guessed)
            .unwrap_or(ImageFormatTag::Other);

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| VeriteError::UndecodableImage(e.to_string()))?;
        let mut pixels = decoded.to_rgb8();
        let original_dimensions = pixels.dimensions();

        let (w, h) = original_dimensions;
        let longest = w.max(h);
        if longest > max_dimension {
            let scale = max_dimension as f64 / longest as f64;
            let nw = ((w as f64 * scale).round() as u32).max(1);
            let nh = ((h as f64 * scale).round() as u32).max(1);
            tracing::debug!("downscaling {}x{} to {}x{}", w, h, nw, nh);
            pixels = image::imageops::resize(&pixels, nw, nh, FilterType::Triangle);
        }

        let sha256 = hex::encode(Sha256::digest(bytes));

        Ok(Self {
            pixels,
            encoded: bytes.to_vec(),
            format,
            sha256,
            original_dimensions,
        })
    }

    /// Decoded RGB pixel buffer, bounded to the configured maximum dimension
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// The original encoded bytes, untouched
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn encoded_len(&self) -> usize {
        self.encoded.len()
    }

    pub fn format(&self) -> ImageFormatTag {
        self.format
    }

    /// Hex SHA-256 digest of the encoded bytes
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Dimensions before any downscale
    pub fn original_dimensions(&self) -> (u32, u32) {
        self.original_dimensions
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_small_png() {
        let img = RgbImage::from_pixel(64, 48, image::Rgb([120, 90, 60]));
        let bytes = encode_png(&img);
        let sample = ImageSample::decode(&bytes, 1024).unwrap();
        assert_eq!(sample.dimensions(), (64, 48));
        assert_eq!(sample.format(), ImageFormatTag::Png);
        assert_eq!(sample.encoded_len(), bytes.len());
        assert_eq!(sample.sha256().len(), 64);
    }

    #[test]
    fn test_oversized_image_is_downscaled_not_rejected() {
        let img = RgbImage::from_pixel(3000, 1500, image::Rgb([10, 20, 30]));
        let bytes = encode_png(&img);
        let sample = ImageSample::decode(&bytes, 1024).unwrap();
        let (w, h) = sample.dimensions();
        assert!(w <= 1024 && h <= 1024, "expected bounded dims, got {}x{}", w, h);
        assert_eq!(sample.original_dimensions(), (3000, 1500));
        // Aspect ratio survives the downscale
        assert_eq!(w, 1024);
        assert_eq!(h, 512);
    }

    #[test]
    fn test_undecodable_bytes_fail_fast() {
        let err = ImageSample::decode(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, VeriteError::UndecodableImage(_)));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let img = RgbImage::from_fn(80, 80, |x, y| image::Rgb([x as u8, y as u8, 77]));
        let bytes = encode_png(&img);
        let a = ImageSample::decode(&bytes, 64).unwrap();
        let b = ImageSample::decode(&bytes, 64).unwrap();
        assert_eq!(a.pixels().as_raw(), b.pixels().as_raw());
        assert_eq!(a.sha256(), b.sha256());
    }
}
