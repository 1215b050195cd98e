//! Image transform engine in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Fit resize** | Lanczos3, missing edge derived from the aspect ratio |
//! | **Fill + crop** | cover-resize then center crop |
//! | **Encode** | JPEG / PNG / WebP (lossless) / AVIF (rav1e) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a variant's transform
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, Rendered};
pub use calculations::{calculate_fill_dimensions, calculate_fit_dimensions};
pub use params::{OutputFormat, Quality, ResizeMode, Transform};
pub use rust_backend::RustBackend;
