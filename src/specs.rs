//! Spec resolution: from a source image and the dimension config to the
//! image's full Spec Set.
//!
//! A Spec Set maps every variant name to its output path and transform, plus
//! the synthetic [`ORIGINAL`] entry that points at the untouched source. All
//! paths are *logical*: relative to the site's source directory, e.g.
//! `images/cat.png` → `images/cat-thumb.png`. The build pass, the sitemap,
//! the reverse index and the cache each anchor the same logical path at their
//! own root, which is what keeps them in agreement.
//!
//! [`resolve`] is pure: no filesystem access, no dependence on file contents
//! or on the order images are processed in. [`resolve_all`] adds the one
//! check that needs the whole site: no two outputs may share a path.

use crate::config::{ConfigError, DimensionConfig, SitePaths, ThumbnailerConfig};
use crate::imaging::Transform;
use crate::naming::{ORIGINAL, variant_file_name};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("output path collision at {}: {first} and {second}", .path.display())]
    Collision {
        path: PathBuf,
        first: String,
        second: String,
    },
    #[error("unknown variant '{name}' for {image}")]
    UnknownVariant { image: String, name: String },
    #[error("image {} is outside the source directory", .0.display())]
    OutsideSource(PathBuf),
}

/// One named output of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    /// Logical output path, relative to the source directory.
    pub path: PathBuf,
    /// `None` for the pass-through original.
    pub transform: Option<Transform>,
}

impl VariantSpec {
    pub fn is_original(&self) -> bool {
        self.transform.is_none()
    }
}

/// Variant name → spec for one source image. `original` always comes first,
/// then the variants in dimension-config order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSet(IndexMap<String, VariantSpec>);

impl SpecSet {
    pub fn get(&self, name: &str) -> Option<&VariantSpec> {
        self.0.get(name)
    }

    pub fn original(&self) -> &VariantSpec {
        &self.0[0]
    }

    /// Every entry including `original`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Generated entries only, with their transforms.
    pub fn variants(&self) -> impl Iterator<Item = (&str, &VariantSpec, &Transform)> {
        self.0.iter().filter_map(|(name, spec)| {
            spec.transform
                .as_ref()
                .map(|transform| (name.as_str(), spec, transform))
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derive the Spec Set for a logical image path.
pub fn resolve(image: &Path, dimensions: &DimensionConfig) -> SpecSet {
    let file_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut specs = IndexMap::with_capacity(dimensions.len() + 1);
    specs.insert(
        ORIGINAL.to_string(),
        VariantSpec {
            path: image.to_path_buf(),
            transform: None,
        },
    );
    for (name, transform) in dimensions.iter() {
        let path = image.with_file_name(variant_file_name(&file_name, name, transform.format));
        specs.insert(
            name.to_string(),
            VariantSpec {
                path,
                transform: Some(*transform),
            },
        );
    }
    SpecSet(specs)
}

/// A discovered source image with its resolved specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Logical path, relative to the source directory.
    pub relative: PathBuf,
    pub specs: SpecSet,
}

/// Resolve every discovered image and reject output path collisions.
///
/// A collision is two variants resolving to the same logical path, or a
/// variant landing on a discovered source image.
pub fn resolve_all(
    source_dir: &Path,
    images: &[PathBuf],
    dimensions: &DimensionConfig,
) -> Result<Vec<ResolvedImage>, SpecError> {
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    let mut resolved = Vec::with_capacity(images.len());

    for source in images {
        let relative = source
            .strip_prefix(source_dir)
            .map_err(|_| SpecError::OutsideSource(source.clone()))?
            .to_path_buf();
        claimed.insert(relative.clone(), describe(&relative, ORIGINAL));
        resolved.push(ResolvedImage {
            specs: resolve(&relative, dimensions),
            source: source.clone(),
            relative,
        });
    }

    for image in &resolved {
        for (name, spec, _) in image.specs.variants() {
            let owner = describe(&image.relative, name);
            if let Some(first) = claimed.insert(spec.path.clone(), owner.clone()) {
                return Err(SpecError::Collision {
                    path: spec.path.clone(),
                    first,
                    second: owner,
                });
            }
        }
    }

    Ok(resolved)
}

/// Discover and resolve every image of a site.
pub fn resolve_site(
    config: &ThumbnailerConfig,
    paths: &SitePaths,
) -> Result<Vec<ResolvedImage>, SpecError> {
    let images = config.discovery()?.find(&paths.images_source_dir);
    resolve_all(&paths.source_dir, &images, &config.dimensions)
}

fn describe(image: &Path, variant: &str) -> String {
    format!("{}:{variant}", image.display())
}
