//! Variant naming: reserved names, name validation, and the output filename
//! scheme shared by the build pass, the sitemap and the reverse index.
//!
//! ## Filename Scheme
//!
//! A variant keeps its source's directory and stem and appends `-{variant}`:
//!
//! - `cat.png` + `thumb` → `cat-thumb.png`
//! - `cat.png` + `large` with `format = "webp"` → `cat-large.png.webp`
//!
//! When the output format differs from the source extension the source
//! extension is kept in the name, so `cat.png` and `cat.jpg` converted to the
//! same format never land on the same path.

use crate::imaging::OutputFormat;

/// Reserved variant name for the untouched source image.
pub const ORIGINAL: &str = "original";

/// Check that a configured variant name is usable in filenames and markup.
///
/// Allowed: ASCII alphanumerics, `_` and `-`. The reserved [`ORIGINAL`] name
/// is rejected.
///
/// Stems may contain `-` too, so the scheme alone is not injective across
/// images: `x.png` + `a-b` and `x-a.png` + `b` both name `x-a-b.png`. Such
/// clashes are left to the site-wide check in
/// [`resolve_all`](crate::specs::resolve_all), which fails with
/// [`SpecError::Collision`](crate::specs::SpecError::Collision) before
/// anything is written.
pub fn validate_variant_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("variant name must not be empty".into());
    }
    if name == ORIGINAL {
        return Err(format!("'{ORIGINAL}' is reserved for the source image"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(format!("variant name '{name}' contains invalid character '{bad}'"));
    }
    Ok(())
}

/// Derive the variant filename for `file_name`.
///
/// `format` is the variant's explicit output format, `None` to keep the
/// source's.
pub fn variant_file_name(file_name: &str, variant: &str, format: Option<OutputFormat>) -> String {
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (file_name, None),
    };

    match (ext, format) {
        (Some(ext), None) => format!("{stem}-{variant}.{ext}"),
        (Some(ext), Some(fmt)) if OutputFormat::from_extension(ext) == Some(fmt) => {
            format!("{stem}-{variant}.{ext}")
        }
        (Some(ext), Some(fmt)) => format!("{stem}-{variant}.{ext}.{}", fmt.extension()),
        (None, Some(fmt)) => format!("{stem}-{variant}.{}", fmt.extension()),
        (None, None) => format!("{stem}-{variant}"),
    }
}
