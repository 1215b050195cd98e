//! Shared test utilities for the thumbnailer test suite.
//!
//! Provides synthetic images, mtime manipulation, and throwaway site trees
//! laid out the way a host site generator would lay them out.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new("thumb = \"100x100^\"");
//! let cat = site.add_image("cat.png", b"pixels");
//! set_mtime(&cat, at(1_000));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::config::{SitePaths, ThumbnailerConfig, parse_config};

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a gradient PNG of the given size.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a gradient JPEG of the given size.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

// =========================================================================
// Timestamps
// =========================================================================

/// A fixed, whole-second point in time `secs` after the epoch.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

/// Force a file's modification time, simulating an external edit.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

// =========================================================================
// Site fixtures
// =========================================================================

/// A temporary project root with default site layout and the given
/// `[dimensions]` body.
pub struct TestSite {
    pub dir: TempDir,
    pub config: ThumbnailerConfig,
    pub paths: SitePaths,
}

impl TestSite {
    pub fn new(dimensions: &str) -> Self {
        Self::with_options("", dimensions)
    }

    /// `options` is top-level TOML placed before `[dimensions]`.
    pub fn with_options(options: &str, dimensions: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = parse_config(&format!("{options}\n[dimensions]\n{dimensions}\n")).unwrap();
        let paths = config.site.resolve(dir.path());
        fs::create_dir_all(&paths.images_source_dir).unwrap();
        Self { dir, config, paths }
    }

    /// Write raw bytes under the images directory. Returns the absolute path.
    pub fn add_image(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.paths.images_source_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Write a real PNG under the images directory.
    pub fn add_png(&self, relative: &str, width: u32, height: u32) -> PathBuf {
        let path = self.paths.images_source_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_test_png(&path, width, height);
        path
    }

    /// Absolute path under the source directory.
    pub fn source(&self, logical: &str) -> PathBuf {
        self.paths.source_dir.join(logical)
    }

    /// Absolute path under the build directory.
    pub fn built(&self, logical: &str) -> PathBuf {
        self.paths.build_dir.join(logical)
    }

    /// Absolute path under the cache directory.
    pub fn cached(&self, logical: &str) -> PathBuf {
        self.paths.cache_dir.join(logical)
    }
}
