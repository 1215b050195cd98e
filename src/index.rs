//! Reverse index: absolute variant path → originating source and transform.
//!
//! Built once, at proxy startup, from the same resolution pipeline the build
//! pass uses. Keys are `source_dir/<logical variant path>`: the location a
//! variant *would* occupy in the source tree, which is what an incoming
//! request path resolves to. Images added or renamed after startup are not
//! picked up until the index is rebuilt.
//!
//! The index is immutable after construction, so concurrent readers share it
//! without locking.

use crate::config::{SitePaths, ThumbnailerConfig};
use crate::imaging::Transform;
use crate::specs::{ResolvedImage, SpecError, resolve_site};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What a variant path was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute path of the source image.
    pub original: PathBuf,
    pub variant: String,
    /// Logical variant path, relative to the source directory.
    pub path: PathBuf,
    pub transform: Transform,
}

#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    entries: HashMap<PathBuf, IndexEntry>,
}

impl ReverseIndex {
    /// Index every non-original variant of `images`.
    pub fn build(source_dir: &Path, images: &[ResolvedImage]) -> Self {
        let entries = images
            .iter()
            .flat_map(|image| {
                image.specs.variants().map(move |(name, spec, transform)| {
                    (
                        source_dir.join(&spec.path),
                        IndexEntry {
                            original: image.source.clone(),
                            variant: name.to_string(),
                            path: spec.path.clone(),
                            transform: *transform,
                        },
                    )
                })
            })
            .collect();
        Self { entries }
    }

    /// Discover and resolve the site, then index it.
    pub fn from_config(config: &ThumbnailerConfig, paths: &SitePaths) -> Result<Self, SpecError> {
        Ok(Self::build(&paths.source_dir, &resolve_site(config, paths)?))
    }

    pub fn lookup(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
