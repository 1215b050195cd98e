//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a fit-inside resize.
///
/// A missing edge is derived from the source aspect ratio. When both edges
/// are given the result fits inside the box and at least one edge matches.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `width` - Target width, or `None` for "auto"
/// * `height` - Target height, or `None` for "auto"
///
/// # Returns
/// * `(width, height)` - Output dimensions, never zero
pub fn calculate_fit_dimensions(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (width.unwrap_or(1).max(1), height.unwrap_or(1).max(1));
    }
    let aspect = src_w as f64 / src_h as f64;

    let (w, h) = match (width, height) {
        (Some(w), None) => (w, (w as f64 / aspect).round() as u32),
        (None, Some(h)) => ((h as f64 * aspect).round() as u32, h),
        (Some(w), Some(h)) => {
            let box_aspect = w as f64 / h as f64;
            if aspect > box_aspect {
                // Source is wider than the box: width is the limiting edge
                (w, (w as f64 / aspect).round() as u32)
            } else {
                ((h as f64 * aspect).round() as u32, h)
            }
        }
        (None, None) => (src_w, src_h),
    };
    (w.max(1), h.max(1))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h)
    }
}
