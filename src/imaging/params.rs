//! Parameter types for image transforms.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the configuration (which names the variants) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing the resolver, the build pass or the proxy.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeMode`]: Fit inside the box, or fill it and center-crop.
//! - [`OutputFormat`]: Encoded format of a variant, with extension and MIME mapping.
//! - [`Transform`]: Full specification of one variant: box, mode, format, quality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// How the source is mapped onto the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Scale to fit inside the box, preserving aspect ratio. A missing edge
    /// is derived from the source aspect ratio.
    #[default]
    Fit,
    /// Scale to cover the box, then center-crop to exactly `width`×`height`.
    Fill,
}

/// Encoded output format of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// Canonical file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// Map a file extension (any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        };
        f.write_str(name)
    }
}

/// Transform parameters for one named variant.
///
/// At least one of `width`/`height` is set; [`ResizeMode::Fill`] requires
/// both. The config layer enforces this before a `Transform` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mode: ResizeMode,
    /// `None` keeps the source image's format.
    pub format: Option<OutputFormat>,
    pub quality: Quality,
}

impl Transform {
    /// Fit inside `width`×`height`.
    pub fn fit(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width,
            height,
            mode: ResizeMode::Fit,
            format: None,
            quality: Quality::default(),
        }
    }

    /// Fill `width`×`height` and center-crop.
    pub fn fill(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            mode: ResizeMode::Fill,
            format: None,
            quality: Quality::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Compact geometry notation: `100x100^`, `800x`, `x600`.
    pub fn geometry(&self) -> String {
        let edge = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        let crop = if self.mode == ResizeMode::Fill { "^" } else { "" };
        format!("{}x{}{}", edge(self.width), edge(self.height), crop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn format_from_extension_ignores_case() {
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("Png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("gif"), None);
    }

    #[test]
    fn format_mime_types() {
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::WebP.mime_type(), "image/webp");
    }

    #[test]
    fn geometry_notation() {
        assert_eq!(Transform::fill(100, 100).geometry(), "100x100^");
        assert_eq!(Transform::fit(Some(800), None).geometry(), "800x");
        assert_eq!(Transform::fit(None, Some(600)).geometry(), "x600");
    }
}
