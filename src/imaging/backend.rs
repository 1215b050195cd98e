//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the transform-engine seam: everything that
//! touches pixels goes through it, so the resolver, the build pass and the
//! caching proxy stay backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::Transform;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// An encoded variant held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Trait for image processing backends.
///
/// `render` serves the request-time path (bytes come back to the caller and
/// are cached), `encode_to` serves the build pass (bytes go straight to the
/// output tree). Both must apply exactly the same transform.
pub trait ImageBackend: Sync {
    /// Transform `source` and return the encoded bytes with their MIME type.
    fn render(&self, source: &Path, transform: &Transform) -> Result<Rendered, BackendError>;

    /// Transform `source` and write the encoded result to `output`.
    fn encode_to(
        &self,
        source: &Path,
        transform: &Transform,
        output: &Path,
    ) -> Result<(), BackendError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn render(&self, source: &Path, transform: &Transform) -> Result<Rendered, BackendError> {
        (**self).render(source, transform)
    }

    fn encode_to(
        &self,
        source: &Path,
        transform: &Transform,
        output: &Path,
    ) -> Result<(), BackendError> {
        (**self).encode_to(source, transform, output)
    }
}
