//! CLI output formatting.
//!
//! Output leads with the logical image path, the identity authors use in
//! their pages, with variants as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 001 images/cat.png
//!     thumb → images/cat-thumb.png
//!     large → images/cat-large.png
//! 002 images/blog/dog.jpg
//!     thumb → images/blog/dog-thumb.jpg
//!     large → images/blog/dog-large.jpg
//!
//! Rendered 4 variants from 2 source images
//! ```
//!
//! ## Specs
//!
//! ```text
//! images/cat.png
//!     original: images/cat.png
//!     thumb: images/cat-thumb.png (100x100^)
//!     web: images/cat-web.png.webp (800x, webp, q85)
//! ```
//!
//! ## Serve
//!
//! ```text
//! images/cat-thumb.png [thumb] rendered, 4.1 KB
//! images/cat-thumb.png [thumb] cached, 4.1 KB
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! Library stages report progress over a channel; [`spawn_printer`] drains
//! it on a background thread with one of the `print_*` wrappers.

use crate::host::Resource;
use crate::imaging::{Quality, Transform};
use crate::precompute::BuildEvent;
use crate::proxy::ProxyEvent;
use crate::serve::RequestFailure;
use crate::specs::SpecSet;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

// ============================================================================
// Printer thread
// ============================================================================

#[derive(Error, Debug)]
#[error("output printer thread panicked")]
pub struct PrinterPanicked;

/// Background thread printing events until every sender is dropped.
pub struct Printer {
    handle: JoinHandle<()>,
}

impl Printer {
    /// Wait for the remaining events to be printed.
    pub fn finish(self) -> Result<(), PrinterPanicked> {
        self.handle.join().map_err(|_| PrinterPanicked)
    }
}

pub fn spawn_printer<T: Send + 'static>(print: fn(&T)) -> (Sender<T>, Printer) {
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        for event in rx {
            print(&event);
        }
    });
    (tx, Printer { handle })
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Geometry plus any non-default format and quality.
///
/// ```text
/// 100x100^
/// 800x, webp, q85
/// ```
fn describe_transform(transform: &Transform) -> String {
    let mut parts = vec![transform.geometry()];
    if let Some(format) = transform.format {
        parts.push(format.to_string());
    }
    if transform.quality != Quality::default() {
        parts.push(format!("q{}", transform.quality.value()));
    }
    parts.join(", ")
}

fn format_bytes(bytes: usize) -> String {
    match bytes {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single precompute progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::ImageRendered {
            index,
            source,
            variants,
            ..
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), source.display())];
            for (name, path) in variants {
                lines.push(format!("{}{} → {}", indent(1), name, path.display()));
            }
            lines
        }
        BuildEvent::Completed(summary) => vec![String::new(), format!("Rendered {summary}")],
    }
}

pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Specs
// ============================================================================

/// Format an image's Spec Set, `original` first.
pub fn format_spec_set(image: &Path, specs: &SpecSet) -> Vec<String> {
    let mut lines = vec![image.display().to_string()];
    for (name, spec) in specs.iter() {
        let line = match &spec.transform {
            Some(transform) => format!(
                "{}{}: {} ({})",
                indent(1),
                name,
                spec.path.display(),
                describe_transform(transform)
            ),
            None => format!("{}{}: {}", indent(1), name, spec.path.display()),
        };
        lines.push(line);
    }
    lines
}

pub fn print_spec_set(image: &Path, specs: &SpecSet) {
    for line in format_spec_set(image, specs) {
        println!("{}", line);
    }
}

// ============================================================================
// Sitemap
// ============================================================================

/// Format projected resources, build paths shown relative to `root`.
pub fn format_resources(resources: &[Resource], root: &Path) -> Vec<String> {
    let mut lines: Vec<String> = resources
        .iter()
        .map(|r| {
            let build = r.build_path.strip_prefix(root).unwrap_or(&r.build_path);
            format!("{} → {}", r.output_path, build.display())
        })
        .collect();
    lines.push(String::new());
    lines.push(format!("{} resources", resources.len()));
    lines
}

pub fn print_resources(resources: &[Resource], root: &Path) {
    for line in format_resources(resources, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of a configuration check.
pub fn format_check(patterns: &[&str], images: usize, variants: usize) -> Vec<String> {
    let mut lines = vec!["Patterns".to_string()];
    for pattern in patterns {
        lines.push(format!("{}{}", indent(1), pattern));
    }
    lines.push(String::new());
    lines.push(format!(
        "OK: {images} source images, {variants} variants, no collisions"
    ));
    lines
}

pub fn print_check(patterns: &[&str], images: usize, variants: usize) {
    for line in format_check(patterns, images, variants) {
        println!("{}", line);
    }
}

// ============================================================================
// Serve
// ============================================================================

pub fn format_proxy_event(event: &ProxyEvent) -> String {
    format!(
        "{} [{}] {}, {}",
        event.path.display(),
        event.variant,
        event.status,
        format_bytes(event.bytes)
    )
}

pub fn print_proxy_event(event: &ProxyEvent) {
    println!("{}", format_proxy_event(event));
}

pub fn format_request_failure(failure: &RequestFailure) -> String {
    format!("{} failed: {}", failure.path, failure.error)
}

pub fn print_request_failure(failure: &RequestFailure) {
    eprintln!("{}", format_request_failure(failure));
}
