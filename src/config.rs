//! Thumbnailer configuration module.
//!
//! Handles loading and validating `thumbnailer.toml`. The configuration is
//! read once at startup, validated, and then passed by reference to every
//! component. Nothing reads it from a global.
//!
//! ## Configuration Options
//!
//! ```toml
//! filetypes = ["jpg", "jpeg", "png"]   # Source extensions (upper-case variants match too)
//! include_data_thumbnails = false      # Advertise all variants via data-thumbnails
//! namespace_directory = ["**"]         # Sub-patterns under the images dir
//!
//! [site]
//! source_dir = "source"
//! build_dir = "build"
//! images_dir = "images"
//! cache_dir = "tmp/thumbnail-cache"
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 4567
//! max_workers = 4                      # Omit for auto = CPU cores
//!
//! [dimensions]                         # Required; declaration order is kept
//! thumb = "100x100^"                   # Fill 100x100, center-crop
//! large = { width = 800, format = "webp", quality = 85 }
//! ```
//!
//! ## Dimension Entries
//!
//! A variant is either a geometry string or a table:
//!
//! - `"WxH"` fits inside the box, `"Wx"` / `"xH"` derive the missing edge
//!   from the source aspect ratio, a trailing `^` fills the box and
//!   center-crops (both edges required).
//! - `{ width, height, crop, format, quality }` is the same, spelled out, plus
//!   an output format (`jpeg`, `png`, `webp`, `avif`) and encoding quality.
//!
//! Every problem with a dimension entry is a configuration error reported at
//! startup, never a per-image failure. Unknown keys are rejected to catch
//! typos early.

use crate::discover::Discovery;
use crate::imaging::{OutputFormat, Quality, Transform};
use crate::naming::validate_variant_name;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILENAME: &str = "thumbnailer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Thumbnailer configuration loaded from `thumbnailer.toml`.
///
/// Everything except `dimensions` has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThumbnailerConfig {
    /// Source image extensions, without the dot.
    #[serde(default = "default_filetypes")]
    pub filetypes: Vec<String>,
    /// Whether rendered `<img>` markup lists every variant in `data-thumbnails`.
    #[serde(default)]
    pub include_data_thumbnails: bool,
    /// Glob sub-patterns under the images directory that are searched.
    #[serde(default = "default_namespaces")]
    pub namespace_directory: Vec<String>,
    /// Host site layout.
    #[serde(default)]
    pub site: SiteConfig,
    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,
    /// Named variants, in declaration order.
    pub dimensions: DimensionConfig,
}

fn default_filetypes() -> Vec<String> {
    vec!["jpg".into(), "jpeg".into(), "png".into()]
}

fn default_namespaces() -> Vec<String> {
    vec!["**".into()]
}

impl ThumbnailerConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filetypes.is_empty() {
            return Err(ConfigError::Validation("filetypes must not be empty".into()));
        }
        for ext in &self.filetypes {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Validation(format!(
                    "filetypes entry '{ext}' must be a bare extension like \"jpg\""
                )));
            }
        }
        if self.namespace_directory.is_empty() {
            return Err(ConfigError::Validation(
                "namespace_directory must not be empty".into(),
            ));
        }
        for ns in &self.namespace_directory {
            let path = Path::new(ns);
            if ns.trim_matches('/').is_empty()
                || path.is_absolute()
                || path.components().any(|c| c == Component::ParentDir)
            {
                return Err(ConfigError::Validation(format!(
                    "namespace_directory entry '{ns}' must be a relative pattern inside the images directory"
                )));
            }
        }
        if self.dimensions.is_empty() {
            return Err(ConfigError::Validation(
                "dimensions must define at least one variant".into(),
            ));
        }
        self.discovery()?;
        Ok(())
    }

    /// Compile the namespace × filetype patterns used to find source images.
    pub fn discovery(&self) -> Result<Discovery, ConfigError> {
        Discovery::new(&self.namespace_directory, &self.filetypes).map_err(|e| {
            ConfigError::Validation(format!("namespace_directory: invalid pattern: {e}"))
        })
    }
}

/// Site layout, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Images directory, relative to `source_dir`.
    pub images_dir: PathBuf,
    /// Request-time cache root.
    pub cache_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: "source".into(),
            build_dir: "build".into(),
            images_dir: "images".into(),
            cache_dir: PathBuf::from("tmp").join("thumbnail-cache"),
        }
    }
}

impl SiteConfig {
    /// Anchor the configured directories at `root`.
    pub fn resolve(&self, root: &Path) -> SitePaths {
        let source_dir = root.join(&self.source_dir);
        SitePaths {
            root: root.to_path_buf(),
            images_source_dir: source_dir.join(&self.images_dir),
            source_dir,
            build_dir: root.join(&self.build_dir),
            images_dir: self.images_dir.clone(),
            cache_dir: root.join(&self.cache_dir),
        }
    }
}

/// Resolved site directories, as the host build pipeline sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Images directory relative to `source_dir`.
    pub images_dir: PathBuf,
    /// `source_dir/images_dir`, the discovery root.
    pub images_source_dir: PathBuf,
    pub cache_dir: PathBuf,
}

/// Development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub interface: String,
    pub port: u16,
    /// Maximum request worker threads. When absent, defaults to the number
    /// of CPU cores. Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".into(),
            port: 4567,
            max_workers: None,
        }
    }
}

/// Resolve the effective request worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least one
pub fn effective_workers(config: &ServeConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_workers
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Ordered mapping from variant name to its transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionConfig(IndexMap<String, Transform>);

impl DimensionConfig {
    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Transform)> {
        self.0.iter().map(|(name, t)| (name.as_str(), t))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Transform)> for DimensionConfig {
    fn from_iter<I: IntoIterator<Item = (S, Transform)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'de> Deserialize<'de> for DimensionConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, toml::Value>::deserialize(deserializer)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            let transform = parse_dimension(&name, value).map_err(serde::de::Error::custom)?;
            entries.insert(name, transform);
        }
        Ok(Self(entries))
    }
}

/// Table form of a dimension entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DimensionTable {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    crop: bool,
    format: Option<OutputFormat>,
    quality: Option<u32>,
}

fn parse_dimension(name: &str, value: toml::Value) -> Result<Transform, String> {
    validate_variant_name(name).map_err(|e| format!("dimensions: {e}"))?;
    let transform = match value {
        toml::Value::String(geometry) => parse_geometry(&geometry),
        table @ toml::Value::Table(_) => {
            let table: DimensionTable = table.try_into().map_err(|e| e.to_string())?;
            build_transform(
                table.width,
                table.height,
                table.crop,
                table.format,
                table.quality,
            )
        }
        other => Err(format!(
            "expected a geometry string or a table, found {}",
            other.type_str()
        )),
    };
    transform.map_err(|e| format!("dimensions.{name}: {e}"))
}

/// Parse `WxH`, `Wx`, `xH`, optionally suffixed with `^` for fill + crop.
pub fn parse_geometry(geometry: &str) -> Result<Transform, String> {
    let trimmed = geometry.trim();
    let (body, crop) = match trimmed.strip_suffix('^') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let (w, h) = body
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("geometry '{geometry}' must look like WxH, Wx or xH"))?;

    let parse_edge = |edge: &str| -> Result<Option<u32>, String> {
        if edge.is_empty() {
            return Ok(None);
        }
        edge.parse::<u32>()
            .map(Some)
            .map_err(|_| format!("invalid edge '{edge}' in geometry '{geometry}'"))
    };

    build_transform(parse_edge(w)?, parse_edge(h)?, crop, None, None)
}

fn build_transform(
    width: Option<u32>,
    height: Option<u32>,
    crop: bool,
    format: Option<OutputFormat>,
    quality: Option<u32>,
) -> Result<Transform, String> {
    if width == Some(0) || height == Some(0) {
        return Err("width and height must be non-zero".into());
    }
    let mut transform = match (width, height, crop) {
        (None, None, _) => return Err("at least one of width or height is required".into()),
        (Some(w), Some(h), true) => Transform::fill(w, h),
        (_, _, true) => return Err("cropping requires both width and height".into()),
        (w, h, false) => Transform::fit(w, h),
    };
    if let Some(format) = format {
        transform = transform.with_format(format);
    }
    if let Some(q) = quality {
        if !(1..=100).contains(&q) {
            return Err(format!("quality must be 1-100, got {q}"));
        }
        transform = transform.with_quality(Quality::new(q));
    }
    Ok(transform)
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<ThumbnailerConfig, ConfigError> {
    let config: ThumbnailerConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config file at `path`.
///
/// A missing file is an error: `dimensions` has no default.
pub fn load_config(path: &Path) -> Result<ThumbnailerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `thumbnailer.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Thumbnailer Configuration
# =========================
# Everything except [dimensions] is optional; values shown are the defaults.
# Unknown keys will cause an error.

# Source image extensions (without the dot). Upper-case spellings match too,
# so "jpg" also finds photo.JPG.
filetypes = ["jpg", "jpeg", "png"]

# When true, thumbnail <img> tags carry a data-thumbnails attribute listing
# every variant as name:path pairs separated by "|".
include_data_thumbnails = false

# Glob sub-patterns under the images directory to search. "**" matches
# everything; use e.g. ["blog", "gallery/*"] to restrict discovery.
namespace_directory = ["**"]

# ---------------------------------------------------------------------------
# Site layout (relative to the directory holding this file)
# ---------------------------------------------------------------------------
[site]
source_dir = "source"
build_dir = "build"
# Images directory, relative to source_dir.
images_dir = "images"
# Where the preview server caches rendered variants.
cache_dir = "tmp/thumbnail-cache"

# ---------------------------------------------------------------------------
# Preview server
# ---------------------------------------------------------------------------
[serve]
interface = "127.0.0.1"
port = 4567
# Maximum request worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_workers = 4

# ---------------------------------------------------------------------------
# Variants (required)
# ---------------------------------------------------------------------------
# name = "WxH"    fit inside the box
# name = "Wx"     fixed width, height from the aspect ratio
# name = "WxH^"   fill the box and center-crop
# name = { width = 800, height = 600, crop = false, format = "webp", quality = 85 }
#
# Variant files are named after the source: cat.png -> cat-thumb.png, or
# cat-large.png.webp when the format changes. "original" is reserved.
[dimensions]
thumb = "100x100^"
large = "800x"
"##
}
