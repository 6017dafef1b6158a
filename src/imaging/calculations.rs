//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::ImagingError;
use super::blob::PageOrientation;
use super::params::{CropRect, Limits, ResizeParams, WatermarkPosition};

/// Fixed inset between a watermark and the canvas edges.
pub const WATERMARK_PADDING: f32 = 20.0;

/// Fraction of each dimension kept sharp by the background blur composite.
pub const FOCAL_FRACTION: f64 = 0.6;

/// Calculate absolute resize dimensions.
///
/// With aspect lock on, width wins whenever it is supplied: the height is
/// always recomputed from it, even if the caller also passed a height.
///
/// # Examples
/// ```
/// # use pixelkit::imaging::{calculate_resize_dimensions, Limits, ResizeParams};
/// let params = ResizeParams { width: Some(400), height: Some(999), maintain_aspect: true };
/// let limits = Limits::default();
/// assert_eq!(calculate_resize_dimensions((800, 600), &params, &limits).unwrap(), (400, 300));
/// ```
pub fn calculate_resize_dimensions(
    source: (u32, u32),
    params: &ResizeParams,
    limits: &Limits,
) -> Result<(u32, u32), ImagingError> {
    params.validate()?;
    let (src_w, src_h) = source;
    let aspect = src_w as f64 / src_h as f64;

    let target = match (params.width, params.height, params.maintain_aspect) {
        (Some(w), _, true) => (w, round_dim(w as f64 / aspect)),
        (None, Some(h), true) => (round_dim(h as f64 * aspect), h),
        (Some(w), Some(h), false) => (w, h),
        _ => {
            return Err(ImagingError::Validation(
                "resize needs a width or a height".into(),
            ));
        }
    };
    check_canvas(target, limits)
}

/// Scale both dimensions by `percent / 100`, rounding to whole pixels.
///
/// # Examples
/// ```
/// # use pixelkit::imaging::{calculate_percentage_dimensions, Limits};
/// let limits = Limits::default();
/// assert_eq!(calculate_percentage_dimensions((1080, 1080), 50.0, &limits).unwrap(), (540, 540));
/// assert_eq!(calculate_percentage_dimensions((333, 101), 100.0, &limits).unwrap(), (333, 101));
/// ```
pub fn calculate_percentage_dimensions(
    source: (u32, u32),
    percent: f64,
    limits: &Limits,
) -> Result<(u32, u32), ImagingError> {
    let factor = percent / 100.0;
    check_canvas(
        (
            round_dim(source.0 as f64 * factor),
            round_dim(source.1 as f64 * factor),
        ),
        limits,
    )
}

/// Pass `dims` through when both sides fit `limits.max_dimension`.
///
/// Every operation that can grow the canvas checks here before allocating.
pub fn check_canvas(dims: (u32, u32), limits: &Limits) -> Result<(u32, u32), ImagingError> {
    if dims.0 > limits.max_dimension || dims.1 > limits.max_dimension {
        return Err(ImagingError::Validation(format!(
            "output {}x{} exceeds the {} pixel edge limit",
            dims.0, dims.1, limits.max_dimension
        )));
    }
    Ok(dims)
}

/// Canvas size that holds the source rotated by `degrees` without clipping.
///
/// `w·|cos θ| + h·|sin θ|` by `w·|sin θ| + h·|cos θ|`, rounded up. Quarter
/// turns come out exact despite floating-point noise in `sin`/`cos`.
pub fn calculate_rotated_dimensions(source: (u32, u32), degrees: f64) -> (u32, u32) {
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (source.0 as f64, source.1 as f64);
    let fit = |v: f64| ((v - 1e-9).ceil() as u32).max(1);
    (fit(w * cos + h * sin), fit(w * sin + h * cos))
}

/// Top-left corner and bottom baseline for watermark text.
///
/// Returns `(x, y)` where `y` is the text's bottom edge.
pub fn calculate_watermark_origin(
    canvas: (u32, u32),
    text_width: f32,
    font_size: f32,
    position: WatermarkPosition,
) -> (f32, f32) {
    let (w, h) = (canvas.0 as f32, canvas.1 as f32);
    let pad = WATERMARK_PADDING;
    match position {
        WatermarkPosition::TopLeft => (pad, font_size + pad),
        WatermarkPosition::TopRight => (w - text_width - pad, font_size + pad),
        WatermarkPosition::BottomLeft => (pad, h - pad),
        WatermarkPosition::BottomRight => (w - text_width - pad, h - pad),
        WatermarkPosition::Center => ((w - text_width) / 2.0, h / 2.0),
    }
}

/// Centered rectangle covering [`FOCAL_FRACTION`] of each dimension.
pub fn calculate_focal_rect(source: (u32, u32)) -> CropRect {
    let margin = (1.0 - FOCAL_FRACTION) / 2.0;
    let (w, h) = (source.0 as f64, source.1 as f64);
    CropRect {
        x: (w * margin).round() as u32,
        y: (h * margin).round() as u32,
        width: (w * FOCAL_FRACTION).round() as u32,
        height: (h * FOCAL_FRACTION).round() as u32,
    }
}

/// Reject crop rectangles that are empty or not fully inside the source.
pub fn check_crop_bounds(source: (u32, u32), rect: &CropRect) -> Result<(), ImagingError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(ImagingError::Validation(
            "crop rectangle must have positive size".into(),
        ));
    }
    let right = rect.x as u64 + rect.width as u64;
    let bottom = rect.y as u64 + rect.height as u64;
    if right > source.0 as u64 || bottom > source.1 as u64 {
        return Err(ImagingError::Bounds(format!(
            "crop {}x{}+{}+{} exceeds {}x{} source",
            rect.width, rect.height, rect.x, rect.y, source.0, source.1
        )));
    }
    Ok(())
}

/// Shrink so the longest edge is at most `max_edge`; never enlarges.
pub fn calculate_fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let longest = source.0.max(source.1);
    if longest <= max_edge {
        return source;
    }
    let scale = max_edge as f64 / longest as f64;
    (
        round_dim(source.0 as f64 * scale),
        round_dim(source.1 as f64 * scale),
    )
}

/// Landscape iff strictly wider than tall.
pub fn page_orientation(source: (u32, u32)) -> PageOrientation {
    if source.0 > source.1 {
        PageOrientation::Landscape
    } else {
        PageOrientation::Portrait
    }
}

fn round_dim(v: f64) -> u32 {
    (v.round() as u32).max(1)
}
