//! Request-time caching proxy.
//!
//! [`ThumbnailProxy`] wraps another [`RequestHandler`] and overlays variant
//! URLs on top of it. Every request goes through the same steps:
//!
//! ```text
//! request ──► inner handler ──► baseline response
//!                │
//!                ▼
//!        source_dir + path ──► reverse index ──(no match)──► baseline, untouched
//!                │ match
//!                ▼
//!        cache entry stamped == source mtime?
//!           yes ──► cached bytes, MIME from the entry path
//!           no  ──► render ──► store (temp + rename) ──► stamp
//!                │
//!                ▼
//!        200, Content-Length, Content-Type, body
//! ```
//!
//! The inner handler always runs first, so the proxy never changes what
//! unrelated routes return. For a matched path the baseline is overwritten
//! entirely; failures surface as a [`HandlerError`] instead of falling back
//! to the baseline, since serving unrelated content under a thumbnail URL
//! would be silent corruption.
//!
//! Requests may run concurrently. The index is read-only and the cache's
//! atomic store tolerates two workers regenerating the same entry, so no
//! locks are taken.

use crate::cache::{CacheCounts, CacheDir, CacheStats, CacheStatus, modified_time};
use crate::config::{SitePaths, ThumbnailerConfig};
use crate::host::{HandlerError, Request, RequestHandler, Response};
use crate::imaging::ImageBackend;
use crate::index::{IndexEntry, ReverseIndex};
use crate::specs::SpecError;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;

/// One served variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEvent {
    /// Logical variant path.
    pub path: PathBuf,
    pub variant: String,
    pub status: CacheStatus,
    pub bytes: usize,
}

pub struct ThumbnailProxy<H, B> {
    inner: H,
    backend: B,
    index: ReverseIndex,
    source_dir: PathBuf,
    cache: CacheDir,
    stats: CacheStats,
    events: Option<Sender<ProxyEvent>>,
}

impl<H: RequestHandler, B: ImageBackend + Send> ThumbnailProxy<H, B> {
    pub fn new(
        inner: H,
        backend: B,
        index: ReverseIndex,
        source_dir: impl Into<PathBuf>,
        cache: CacheDir,
    ) -> Self {
        Self {
            inner,
            backend,
            index,
            source_dir: source_dir.into(),
            cache,
            stats: CacheStats::default(),
            events: None,
        }
    }

    /// Build the reverse index for the site and wrap `inner`.
    pub fn from_config(
        inner: H,
        backend: B,
        config: &ThumbnailerConfig,
        paths: &SitePaths,
    ) -> Result<Self, SpecError> {
        let index = ReverseIndex::from_config(config, paths)?;
        Ok(Self::new(
            inner,
            backend,
            index,
            &paths.source_dir,
            CacheDir::new(&paths.cache_dir),
        ))
    }

    pub fn with_events(mut self, events: Sender<ProxyEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    pub fn stats(&self) -> CacheCounts {
        self.stats.snapshot()
    }

    /// Cached or freshly rendered bytes for a matched variant, with MIME type.
    fn resolve_variant(
        &self,
        entry: &IndexEntry,
    ) -> Result<(Vec<u8>, String, CacheStatus), HandlerError> {
        let cache_file = self.cache.entry_path(&entry.path);
        if let Some(parent) = cache_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| HandlerError::CacheDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let source_mtime =
            modified_time(&entry.original).map_err(|source| HandlerError::Source {
                path: entry.original.clone(),
                source,
            })?;

        if let Some(bytes) = self.cache.read_fresh(&cache_file, source_mtime)? {
            let mime = mime_guess::from_path(&cache_file)
                .first_or_octet_stream()
                .to_string();
            return Ok((bytes, mime, CacheStatus::Hit));
        }

        let rendered = self
            .backend
            .render(&entry.original, &entry.transform)
            .map_err(|source| HandlerError::Render {
                path: entry.original.clone(),
                source,
            })?;
        self.cache
            .store(&cache_file, &rendered.bytes, source_mtime)
            .map_err(|source| HandlerError::CacheWrite {
                path: cache_file.clone(),
                source,
            })?;
        Ok((rendered.bytes, rendered.mime_type, CacheStatus::Regenerated))
    }
}

impl<H: RequestHandler, B: ImageBackend + Send> RequestHandler for ThumbnailProxy<H, B> {
    fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        let mut response = self.inner.call(request)?;

        let entry = resolve_request_path(&self.source_dir, &request.path)
            .and_then(|path| self.index.lookup(&path));
        let Some(entry) = entry else {
            self.stats.pass_through();
            return Ok(response);
        };

        let (body, mime, status) = self.resolve_variant(entry)?;
        self.stats.record(status);
        if let Some(tx) = &self.events {
            tx.send(ProxyEvent {
                path: entry.path.clone(),
                variant: entry.variant.clone(),
                status,
                bytes: body.len(),
            })
            .ok();
        }

        response.status = 200;
        response.set_header("Content-Length", &body.len().to_string());
        response.set_header("Content-Type", &mime);
        response.body = body;
        Ok(response)
    }
}

/// Map a raw request target onto the source tree.
///
/// Strips query and fragment, percent-decodes, and drops empty and `.`
/// segments. Any `..` segment, or a target that is not valid UTF-8 once
/// decoded, yields `None`.
pub fn resolve_request_path(source_dir: &Path, target: &str) -> Option<PathBuf> {
    let path = target
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    let mut resolved = source_dir.to_path_buf();
    for segment in decoded.split('/') {
        match Path::new(segment).components().next() {
            None | Some(Component::CurDir) => {}
            Some(Component::Normal(_)) if !segment.contains('\\') => resolved.push(segment),
            _ => return None,
        }
    }
    Some(resolved)
}
