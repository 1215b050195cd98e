//! Build-time precomputation.
//!
//! Runs once per build, before the host finalizes its output: discovers every
//! source image, resolves its Spec Set and renders each non-original variant
//! straight into the build tree at `build_dir/<logical variant path>`.
//!
//! ```text
//! source/images/cat.png  ──thumb──►  build/images/cat-thumb.png
//!                        ──large──►  build/images/cat-large.png
//! ```
//!
//! The pass is sequential and exhaustive. It neither reads nor fills the
//! request-time cache: the build output is the only artifact. The first
//! render failure aborts the pass, because a missing variant would otherwise
//! ship as a broken reference.
//!
//! Progress is reported through an optional [`BuildEvent`] channel; the
//! library itself never prints.

use crate::config::{SitePaths, ThumbnailerConfig};
use crate::host::{BuildHook, BuildHookSource, HookError};
use crate::imaging::{BackendError, ImageBackend};
use crate::specs::{SpecError, resolve_site};
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecomputeError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("cannot create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render {variant} of {}: {source}", .image.display())]
    Render {
        image: PathBuf,
        variant: String,
        source: BackendError,
    },
}

/// Progress events emitted by the precompute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// All variants of one source image were written.
    ImageRendered {
        /// 1-based position in the pass.
        index: usize,
        total: usize,
        /// Logical source path.
        source: PathBuf,
        /// Variant name → logical output path, in dimension order.
        variants: Vec<(String, PathBuf)>,
    },
    Completed(PrecomputeSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecomputeSummary {
    pub images: usize,
    pub variants: usize,
}

impl fmt::Display for PrecomputeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variants from {} source images",
            self.variants, self.images
        )
    }
}

/// Render every non-original variant of every discovered image into the
/// build directory.
pub fn precompute(
    backend: &impl ImageBackend,
    config: &ThumbnailerConfig,
    paths: &SitePaths,
    events: Option<&Sender<BuildEvent>>,
) -> Result<PrecomputeSummary, PrecomputeError> {
    let images = resolve_site(config, paths)?;
    let total = images.len();
    let mut summary = PrecomputeSummary::default();

    for (i, image) in images.iter().enumerate() {
        let mut written = Vec::new();
        for (name, spec, transform) in image.specs.variants() {
            let output = paths.build_dir.join(&spec.path);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(|source| PrecomputeError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            backend
                .encode_to(&image.source, transform, &output)
                .map_err(|source| PrecomputeError::Render {
                    image: image.relative.clone(),
                    variant: name.to_string(),
                    source,
                })?;
            written.push((name.to_string(), spec.path.clone()));
        }

        summary.images += 1;
        summary.variants += written.len();
        if let Some(tx) = events {
            tx.send(BuildEvent::ImageRendered {
                index: i + 1,
                total,
                source: image.relative.clone(),
                variants: written,
            })
            .ok();
        }
    }

    if let Some(tx) = events {
        tx.send(BuildEvent::Completed(summary)).ok();
    }
    Ok(summary)
}

/// The precompute pass as a host pre-build hook.
pub struct Precompute<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a ThumbnailerConfig,
    events: Option<Sender<BuildEvent>>,
}

impl<'a, B: ImageBackend> Precompute<'a, B> {
    pub fn new(backend: &'a B, config: &'a ThumbnailerConfig) -> Self {
        Self {
            backend,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Register with the host's pre-build hook point.
    pub fn attach(self, host: &mut impl BuildHookSource<'a>) {
        host.before_build(Box::new(self));
    }
}

impl<B: ImageBackend> BuildHook for Precompute<'_, B> {
    fn before_build(&mut self, paths: &SitePaths) -> Result<(), HookError> {
        precompute(self.backend, self.config, paths, self.events.as_ref())?;
        Ok(())
    }
}
