//! Pure Rust image processing backend, no system libraries.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Fit resize | `image::DynamicImage::resize_exact` with `Lanczos3`, edges from [`calculate_fit_dimensions`] |
//! | Fill + crop | `resize_exact` to [`calculate_fill_dimensions`], then a centered `crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honoured) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend, Rendered};
use super::calculations::{calculate_fill_dimensions, calculate_fit_dimensions};
use super::params::{OutputFormat, ResizeMode, Transform};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Apply the resize described by `transform`.
fn apply_transform(img: &DynamicImage, transform: &Transform) -> DynamicImage {
    let source = (img.width(), img.height());
    match (transform.mode, transform.width, transform.height) {
        (ResizeMode::Fill, Some(w), Some(h)) => {
            let (fill_w, fill_h) = calculate_fill_dimensions(source, (w, h));
            let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
            let x = fill_w.saturating_sub(w) / 2;
            let y = fill_h.saturating_sub(h) / 2;
            filled.crop_imm(x, y, w.min(fill_w), h.min(fill_h))
        }
        (_, width, height) => {
            let (w, h) = calculate_fit_dimensions(source, width, height);
            if (w, h) == source {
                img.clone()
            } else {
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
        }
    }
}

/// Pick the output format: explicit transform format, else the source's own.
fn target_format(source: &Path, transform: &Transform) -> Result<OutputFormat, BackendError> {
    transform
        .format
        .or_else(|| OutputFormat::from_path(source))
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Cannot infer output format for {}",
                source.display()
            ))
        })
}

/// Encode to an in-memory buffer.
fn encode(img: &DynamicImage, format: OutputFormat, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let quality = quality.clamp(1, 100) as u8;

    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
            img.write_with_encoder(encoder)
        }
        OutputFormat::WebP => {
            let normalized = normalize_8bit(img);
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut bytes);
            normalized.write_with_encoder(encoder)
        }
        OutputFormat::Avif => {
            let normalized = normalize_8bit(img);
            let encoder =
                image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut bytes, 6, quality);
            normalized.write_with_encoder(encoder)
        }
    };

    result.map_err(|e| BackendError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(bytes)
}

/// Reduce to 8-bit RGB(A), which every lossy encoder here accepts.
fn normalize_8bit(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

impl ImageBackend for RustBackend {
    fn render(&self, source: &Path, transform: &Transform) -> Result<Rendered, BackendError> {
        let format = target_format(source, transform)?;
        let img = load_image(source)?;
        let transformed = apply_transform(&img, transform);
        let bytes = encode(&transformed, format, transform.quality.value())?;
        Ok(Rendered {
            bytes,
            mime_type: format.mime_type().to_string(),
        })
    }

    fn encode_to(
        &self,
        source: &Path,
        transform: &Transform,
        output: &Path,
    ) -> Result<(), BackendError> {
        let rendered = self.render(source, transform)?;
        std::fs::write(output, rendered.bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{write_test_jpeg, write_test_png};

    #[test]
    fn render_fill_crops_to_exact_box() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("cat.png");
        write_test_png(&source, 400, 300);

        let rendered = RustBackend::new()
            .render(&source, &Transform::fill(100, 100))
            .unwrap();

        assert_eq!(rendered.mime_type, "image/png");
        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
    }

    #[test]
    fn render_fit_with_auto_height_keeps_aspect() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("wide.jpg");
        write_test_jpeg(&source, 400, 200);

        let rendered = RustBackend::new()
            .render(&source, &Transform::fit(Some(100), None))
            .unwrap();

        assert_eq!(rendered.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn render_converts_to_requested_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("cat.png");
        write_test_png(&source, 64, 64);

        let transform = Transform::fit(Some(32), None).with_format(OutputFormat::WebP);
        let rendered = RustBackend::new().render(&source, &transform).unwrap();

        assert_eq!(rendered.mime_type, "image/webp");
        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!(decoded.width(), 32);
    }

    #[test]
    fn render_jpeg_from_png_with_quality() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("cat.png");
        write_test_png(&source, 80, 60);

        let transform = Transform::fit(Some(40), Some(40))
            .with_format(OutputFormat::Jpeg)
            .with_quality(Quality::new(70));
        let rendered = RustBackend::new().render(&source, &transform).unwrap();

        assert_eq!(rendered.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn render_unknown_source_format_without_target_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("image.bin");
        std::fs::write(&source, b"not an image").unwrap();

        let result = RustBackend::new().render(&source, &Transform::fill(10, 10));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn render_corrupt_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.png");
        std::fs::write(&source, b"definitely not a png").unwrap();

        let result = RustBackend::new().render(&source, &Transform::fill(10, 10));
        assert!(result.is_err());
    }

    #[test]
    fn encode_to_writes_decodable_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("cat.jpg");
        write_test_jpeg(&source, 300, 300);
        let output = tmp.path().join("cat-thumb.jpg");

        RustBackend::new()
            .encode_to(&source, &Transform::fill(50, 50), &output)
            .unwrap();

        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 50));
    }
}
