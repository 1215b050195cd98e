//! Collaborator interfaces towards the host site generator.
//!
//! The thumbnailer does not assume a particular host. It attaches to three
//! narrow seams, and anything that implements them can drive it:
//!
//! | Seam | Used by | Purpose |
//! |------|---------|---------|
//! | [`BuildHookSource`] | [`precompute`](crate::precompute) | Pre-build hook point plus the resolved site paths |
//! | [`ResourceRegistry`] | [`sitemap`](crate::sitemap) | The host's list of output resources |
//! | [`RequestHandler`] | [`proxy`](crate::proxy) | Request middleware, wrapping another handler |
//!
//! The CLI wires these to [`BuildPipeline`], [`Sitemap`](crate::sitemap::Sitemap)
//! and the development server in [`serve`](crate::serve).

use crate::config::SitePaths;
use crate::imaging::BackendError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Requests
// ============================================================================

/// An inbound request, reduced to what the handlers look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Raw request target, possibly percent-encoded and with a query string.
    pub path: String,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".into(),
            path: path.into(),
        }
    }
}

/// A response under construction. Header names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(404)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(b"Not Found".to_vec())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Replace any existing header of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create cache directory {}: {source}", .path.display())]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read source image {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        source: BackendError,
    },
    #[error("cannot write cache entry {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Request middleware. Implementations may wrap another handler.
///
/// Handlers are shared across server worker threads.
pub trait RequestHandler: Send + Sync {
    fn call(&self, request: &Request) -> Result<Response, HandlerError>;
}

impl<F> RequestHandler for F
where
    F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync,
{
    fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        self(request)
    }
}

// ============================================================================
// Build lifecycle
// ============================================================================

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Work that must finish before the host build proceeds.
pub trait BuildHook {
    fn before_build(&mut self, paths: &SitePaths) -> Result<(), HookError>;
}

/// The host's pre-build hook point.
pub trait BuildHookSource<'a> {
    /// Site directories the hooks run against.
    fn paths(&self) -> &SitePaths;

    fn before_build(&mut self, hook: Box<dyn BuildHook + 'a>);
}

/// Minimal host build pipeline: runs registered hooks in order, stopping at
/// the first failure.
pub struct BuildPipeline<'a> {
    paths: SitePaths,
    hooks: Vec<Box<dyn BuildHook + 'a>>,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(paths: SitePaths) -> Self {
        Self {
            paths,
            hooks: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<(), HookError> {
        for hook in &mut self.hooks {
            hook.before_build(&self.paths)?;
        }
        Ok(())
    }
}

impl<'a> BuildHookSource<'a> for BuildPipeline<'a> {
    fn paths(&self) -> &SitePaths {
        &self.paths
    }

    fn before_build(&mut self, hook: Box<dyn BuildHook + 'a>) {
        self.hooks.push(hook);
    }
}

// ============================================================================
// Resource registry
// ============================================================================

/// An output resource the host must know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Resource {
    /// Site-relative output path, e.g. `images/cat-thumb.png`.
    pub output_path: String,
    /// Where the built file lives.
    pub build_path: PathBuf,
}

/// The host's list of output resources.
pub trait ResourceRegistry {
    fn resources(&self) -> &[Resource];

    /// Add a resource. Returns `false` when the registry already has one
    /// with the same identity and kept the existing entry.
    fn register(&mut self, resource: Resource) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut response = Response::new(200).with_header("content-type", "text/html");
        response.set_header("Content-Type", "image/png");

        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.header("CONTENT-TYPE"), Some("image/png"));
    }

    #[test]
    fn not_found_response() {
        let response = Response::not_found();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"Not Found");
    }

    #[test]
    fn closures_are_handlers() {
        let handler = |req: &Request| -> Result<Response, HandlerError> {
            Ok(Response::new(200).with_body(req.path.clone().into_bytes()))
        };
        let response = handler.call(&Request::get("/x")).unwrap();
        assert_eq!(response.body, b"/x");
    }

    struct Recording {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        fail: bool,
    }

    impl BuildHook for Recording {
        fn before_build(&mut self, _paths: &SitePaths) -> Result<(), HookError> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                return Err(format!("{} failed", self.name).into());
            }
            Ok(())
        }
    }

    fn paths() -> SitePaths {
        crate::config::SiteConfig::default().resolve(Path::new("/site"))
    }

    #[test]
    fn pipeline_runs_hooks_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = BuildPipeline::new(paths());
        for name in ["first", "second"] {
            pipeline.before_build(Box::new(Recording {
                name,
                log: log.clone(),
                fail: false,
            }));
        }

        pipeline.run().unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn pipeline_stops_at_first_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = BuildPipeline::new(paths());
        pipeline.before_build(Box::new(Recording {
            name: "broken",
            log: log.clone(),
            fail: true,
        }));
        pipeline.before_build(Box::new(Recording {
            name: "never",
            log: log.clone(),
            fail: false,
        }));

        let err = pipeline.run().unwrap_err();
        assert_eq!(err.to_string(), "broken failed");
        assert_eq!(*log.borrow(), vec!["broken"]);
    }
}
