//! # Thumbnailer
//!
//! Derived image variants ("thumbnails") for static site generators. Every
//! source image under the site's images directory gets one variant per entry
//! in the `[dimensions]` config, rendered two ways:
//!
//! - **At build time**, eagerly: every variant of every image is written into
//!   the build tree before the host finalizes its output.
//! - **At preview time**, lazily: a caching proxy renders a variant on its
//!   first request and serves it from disk until the source image changes.
//!
//! # Architecture: One Resolution Pipeline, Three Consumers
//!
//! ```text
//!                          ┌─► precompute   build/images/cat-thumb.png
//! discover ─► specs ───────┼─► sitemap      { output_path, build_path }
//!                          └─► index ─► proxy   GET /images/cat-thumb.png
//! ```
//!
//! Discovery and spec resolution run once and feed every consumer, so the
//! build pass, the sitemap and the preview proxy always agree on which
//! variants exist and where they live. Paths are carried as *logical* paths
//! relative to the source directory (`images/cat-thumb.png`); each consumer
//! anchors them at its own root (build dir, source dir, cache dir).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `thumbnailer.toml` loading, dimension parsing, validation, site paths |
//! | [`discover`] | Finds source images: namespace × extension glob cross product |
//! | [`naming`] | Variant filename scheme and variant name rules |
//! | [`specs`] | Spec Set resolution and site-wide collision checks |
//! | [`imaging`] | Transform engine: `ImageBackend` trait and the pure-Rust backend |
//! | [`host`] | Seams towards the host generator: build hooks, resource registry, request handlers |
//! | [`precompute`] | Build-time pass rendering every variant into the build tree |
//! | [`sitemap`] | Projects variants into the host's resource registry |
//! | [`index`] | Reverse index from variant path to source and transform |
//! | [`cache`] | Request-time cache: mtime-stamped entries, atomic stores |
//! | [`proxy`] | Request-time caching proxy wrapping another handler |
//! | [`markup`] | Template helpers: variant URLs and `<img>` tags |
//! | [`serve`] | Development preview server |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Source mtime Equality as the Cache Oracle
//!
//! A cache entry is valid when its mtime *equals* its source image's mtime;
//! the proxy stamps it that way after every render. Editing a source bumps
//! its mtime and invalidates every variant derived from it, with no content
//! hashing and no dependency tracking. Equality rather than ordering means a
//! source restored from an older backup is also re-rendered.
//!
//! ## Startup-Built Reverse Index
//!
//! The proxy resolves every image once when it starts. Request handling is a
//! hash lookup against an immutable map and needs no locks. Images added
//! while the preview server runs appear after a restart.
//!
//! ## Explicit Configuration, No Globals
//!
//! The validated config is built once in `main` and passed by reference to
//! each component. Tests construct configs directly from TOML strings.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] backend uses the `image` crate (Lanczos3 resampling) for
//! decoding, resizing and encoding JPEG, PNG, WebP and AVIF. No ImageMagick,
//! no system libraries: the binary is self-contained.

pub mod cache;
pub mod config;
pub mod discover;
pub mod host;
pub mod imaging;
pub mod index;
pub mod markup;
pub mod naming;
pub mod output;
pub mod precompute;
pub mod proxy;
pub mod serve;
pub mod sitemap;
pub mod specs;

#[cfg(test)]
pub(crate) mod test_helpers;
