//! High-level image operations.
//!
//! Each function is one pipeline stage: decode the input blob, run one
//! transform, encode a fresh blob. They take the backend and validated
//! parameters, never mutate the input, and either return a complete blob or
//! exactly one [`ImagingError`]. Successive edits are plain composition:
//!
//! ```
//! # use pixelkit::imaging::{operations, RustBackend, ImageBlob, FlipAxis, Limits};
//! # fn demo(input: &ImageBlob) -> Result<ImageBlob, pixelkit::imaging::ImagingError> {
//! let backend = RustBackend::new();
//! let rotated = operations::rotate(&backend, input, 90.0, &Limits::default())?;
//! let flipped = operations::flip(&backend, &rotated, FlipAxis::Horizontal)?;
//! operations::convert(&backend, &flipped, "webp")
//! # }
//! ```

use super::backend::{ImageBackend, ImagingError};
use super::blob::{DocumentBlob, Exported, ImageBlob, TargetFormat};
use super::buffer::PixelBuffer;
use super::calculations::{
    calculate_fit_within, calculate_focal_rect, calculate_percentage_dimensions,
    calculate_resize_dimensions, calculate_rotated_dimensions, calculate_watermark_origin,
    check_canvas, page_orientation,
};
use super::color::{adjustment_steps, filter_steps, run_filter_chain};
use super::exif_parser::MetadataReport;
use super::params::{
    Adjustments, BlurRadius, CropRect, CssColor, FlipAxis, Limits, NamedFilter, Percent,
    Quality, ResizeParams, Tolerance, WatermarkOptions,
};
use super::{chroma, document, geometry};
use crate::naming;
use tracing::{debug, info, instrument, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

// =========================================================================
// Decode / encode
// =========================================================================

/// Decode a blob into pixels at its natural size.
pub fn decode(backend: &impl ImageBackend, blob: &ImageBlob) -> Result<PixelBuffer> {
    backend.decode(blob.bytes())
}

/// Encode pixels into a new blob named `name`.
pub fn encode(
    backend: &impl ImageBackend,
    buffer: &PixelBuffer,
    format: TargetFormat,
    quality: Quality,
    name: &str,
) -> Result<ImageBlob> {
    let bytes = backend.encode(buffer, format, quality)?;
    Ok(ImageBlob::new(bytes, format.mime(), name))
}

/// Format and name for an edit that keeps the input's format.
///
/// Inputs we can read but not write (TIFF) come out as PNG, renamed.
fn same_format_target(blob: &ImageBlob) -> (TargetFormat, String) {
    match blob.format() {
        Some(format) => (format, blob.name().to_string()),
        None => {
            debug!(mime = blob.mime(), "input format not writable, re-encoding as png");
            let format = TargetFormat::Png;
            (format, naming::replace_extension(blob.name(), format.extension()))
        }
    }
}

/// Encode an edited buffer in the input's format at full quality.
fn finish_edit(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    buffer: &PixelBuffer,
    operation: &'static str,
) -> Result<ImageBlob> {
    let (format, name) = same_format_target(blob);
    encode(backend, buffer, format, Quality::MAX, &name).map_err(|e| e.in_operation(operation))
}

/// Natural pixel size.
pub fn dimensions(backend: &impl ImageBackend, blob: &ImageBlob) -> Result<(u32, u32)> {
    Ok(decode(backend, blob)?.dimensions())
}

// =========================================================================
// Format conversion and document export
// =========================================================================

/// Re-encode at maximum quality in `target`, named `converted.<target>`.
///
/// The requested spelling is kept (`jpeg` gives `converted.jpeg`). Unknown
/// names produce PNG named `converted.png`.
#[instrument(skip(backend, blob), fields(file = %blob.name(), size = blob.size()))]
pub fn convert(backend: &impl ImageBackend, blob: &ImageBlob, target: &str) -> Result<ImageBlob> {
    let (format, extension) = match TargetFormat::from_name(target) {
        Some(format) => (format, target.trim().to_ascii_lowercase()),
        None => {
            let format = TargetFormat::parse_lenient(target);
            (format, format.extension().to_string())
        }
    };
    let buffer = decode(backend, blob)?;
    let out = encode(
        backend,
        &buffer,
        format,
        Quality::MAX,
        &naming::converted_name(&extension),
    )
    .map_err(|e| e.in_operation("convert"))?;
    info!(output = out.size(), format = %format, "converted");
    Ok(out)
}

/// Dispatch on a target name: `pdf` exports a document, anything else converts.
pub fn export(backend: &impl ImageBackend, blob: &ImageBlob, target: &str) -> Result<Exported> {
    if target.trim().eq_ignore_ascii_case("pdf") {
        Ok(Exported::Document(to_document(backend, blob)?))
    } else {
        Ok(Exported::Image(convert(backend, blob, target)?))
    }
}

/// Wrap the image as the single page of a PDF sized to its pixels.
#[instrument(skip(backend, blob), fields(file = %blob.name(), size = blob.size()))]
pub fn to_document(backend: &impl ImageBackend, blob: &ImageBlob) -> Result<DocumentBlob> {
    let buffer = decode(backend, blob)?;
    let (width, height) = buffer.dimensions();
    let jpeg = backend
        .encode(&buffer, TargetFormat::Jpeg, Quality::MAX)
        .map_err(|e| e.in_operation("pdf export"))?;
    let bytes = document::pdf_from_jpeg(jpeg, width, height)?;
    let orientation = page_orientation((width, height));
    info!(output = bytes.len(), ?orientation, "exported pdf");
    Ok(DocumentBlob {
        bytes,
        name: naming::converted_name("pdf"),
        page_width: width,
        page_height: height,
        orientation,
    })
}

// =========================================================================
// Resize and compress
// =========================================================================

/// Resize to absolute dimensions; see [`calculate_resize_dimensions`] for
/// the aspect-lock rules. Targets past `limits.max_dimension` are rejected.
#[instrument(skip(backend, blob, limits), fields(file = %blob.name()))]
pub fn resize_absolute(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    params: &ResizeParams,
    limits: &Limits,
) -> Result<ImageBlob> {
    params.validate()?;
    for side in [params.width, params.height].into_iter().flatten() {
        check_canvas((side, 1), limits)?;
    }
    let buffer = decode(backend, blob)?;
    let (width, height) = calculate_resize_dimensions(buffer.dimensions(), params, limits)?;
    debug!(from = ?buffer.dimensions(), to = ?(width, height), "resizing");
    let scaled = backend.scale(&buffer, width, height);
    finish_edit(backend, blob, &scaled, "resize")
}

/// Scale both dimensions by a percentage.
#[instrument(skip(backend, blob, limits), fields(file = %blob.name()))]
pub fn resize_percentage(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    percent: Percent,
    limits: &Limits,
) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    let (width, height) =
        calculate_percentage_dimensions(buffer.dimensions(), percent.value(), limits)?;
    debug!(from = ?buffer.dimensions(), to = ?(width, height), "resizing");
    let scaled = backend.scale(&buffer, width, height);
    finish_edit(backend, blob, &scaled, "resize")
}

/// Lossy re-encode in the input's own format.
///
/// The longest edge is first capped at `max_edge`. When the result is not
/// smaller than the input, the input itself is returned.
#[instrument(skip(backend, blob), fields(file = %blob.name(), size = blob.size()))]
pub fn compress(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    quality: Quality,
    max_edge: u32,
) -> Result<ImageBlob> {
    let mut buffer = decode(backend, blob)?;
    let fitted = calculate_fit_within(buffer.dimensions(), max_edge);
    if fitted != buffer.dimensions() {
        debug!(from = ?buffer.dimensions(), to = ?fitted, "capping longest edge");
        buffer = backend.scale(&buffer, fitted.0, fitted.1);
    }
    let (format, name) = same_format_target(blob);
    let out = encode(backend, &buffer, format, quality, &name)
        .map_err(|e| e.in_operation("compress"))?;
    if out.size() >= blob.size() {
        info!(
            original = blob.size(),
            compressed = out.size(),
            "compression did not shrink the file, keeping original"
        );
        return Ok(blob.clone());
    }
    info!(original = blob.size(), compressed = out.size(), "compressed");
    Ok(out)
}

/// Re-encode as WebP, renaming the extension.
#[instrument(skip(backend, blob), fields(file = %blob.name(), size = blob.size()))]
pub fn compress_to_webp(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    quality: Quality,
) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    let format = TargetFormat::Webp;
    let name = naming::replace_extension(blob.name(), format.extension());
    encode(backend, &buffer, format, quality, &name).map_err(|e| e.in_operation("compress"))
}

// =========================================================================
// Geometric edits
// =========================================================================

/// Rotate clockwise around the center; the canvas grows to fit, up to
/// `limits.max_dimension` per edge.
#[instrument(skip(backend, blob, limits), fields(file = %blob.name()))]
pub fn rotate(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    degrees: f64,
    limits: &Limits,
) -> Result<ImageBlob> {
    if !degrees.is_finite() {
        return Err(ImagingError::Validation(format!(
            "rotation angle {degrees} is not a finite number"
        )));
    }
    let buffer = decode(backend, blob)?;
    check_canvas(calculate_rotated_dimensions(buffer.dimensions(), degrees), limits)?;
    finish_edit(backend, blob, &geometry::rotate(&buffer, degrees), "rotate")
}

#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn flip(backend: &impl ImageBackend, blob: &ImageBlob, axis: FlipAxis) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    finish_edit(backend, blob, &geometry::flip(&buffer, axis), "flip")
}

#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn crop(backend: &impl ImageBackend, blob: &ImageBlob, rect: &CropRect) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    let cropped = geometry::crop(&buffer, rect)?;
    finish_edit(backend, blob, &cropped, "crop")
}

// =========================================================================
// Color edits
// =========================================================================

/// Brightness, then contrast, then saturation.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn adjust(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    adjustments: &Adjustments,
) -> Result<ImageBlob> {
    adjustments.validate()?;
    let buffer = decode(backend, blob)?;
    let adjusted = run_filter_chain(backend, buffer, &adjustment_steps(adjustments));
    finish_edit(backend, blob, &adjusted, "adjust")
}

/// Apply a preset by name. Unknown names re-encode the image unchanged.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn apply_filter(backend: &impl ImageBackend, blob: &ImageBlob, name: &str) -> Result<ImageBlob> {
    let steps = match NamedFilter::from_name(name) {
        Some(filter) => filter_steps(filter),
        None => {
            warn!(filter = name, "unknown filter, leaving pixels unchanged");
            Vec::new()
        }
    };
    let buffer = decode(backend, blob)?;
    let filtered = run_filter_chain(backend, buffer, &steps);
    finish_edit(backend, blob, &filtered, "filter")
}

// =========================================================================
// Watermark
// =========================================================================

/// Draw `text` at one of five anchors, 20px in from the edges.
///
/// Callers should reject empty text: it is not an error, but the output is
/// just a re-encode of the input.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn add_text_watermark(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    text: &str,
    options: &WatermarkOptions,
) -> Result<ImageBlob> {
    options.validate()?;
    if text.is_empty() {
        warn!("empty watermark text, nothing will be drawn");
    }
    let mut buffer = decode(backend, blob)?;
    let font = options.font();
    let text_width = backend.measure_text(text, &font);
    let origin = calculate_watermark_origin(
        buffer.dimensions(),
        text_width,
        options.font_size,
        options.position,
    );
    debug!(text_width, ?origin, "placing watermark");
    backend.draw_text(&mut buffer, text, origin, &font, options.color);
    finish_edit(backend, blob, &buffer, "watermark")
}

// =========================================================================
// Chroma background
// =========================================================================

/// Make background-colored pixels transparent. Always produces PNG.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn transparentize(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    tolerance: Tolerance,
) -> Result<ImageBlob> {
    let mut buffer = decode(backend, blob)?;
    let cleared = chroma::punch_out(&mut buffer, tolerance.value());
    debug!(cleared, "background pixels cleared");
    let format = TargetFormat::Png;
    let name = naming::replace_extension(blob.name(), format.extension());
    encode(backend, &buffer, format, Quality::MAX, &name)
        .map_err(|e| e.in_operation("background removal"))
}

/// Paint background-colored pixels with `color` (hex or CSS color).
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn replace_background(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    color: &str,
    tolerance: Tolerance,
) -> Result<ImageBlob> {
    let fill = CssColor::parse(color)?;
    let buffer = decode(backend, blob)?;
    let replaced = chroma::replace_background(&buffer, fill.rgb(), tolerance.value());
    finish_edit(backend, blob, &replaced, "background replace")
}

/// Blur everything outside the centered 60% focal rectangle.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn blur_background(
    backend: &impl ImageBackend,
    blob: &ImageBlob,
    radius: BlurRadius,
) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    let mut blurred = backend.blur(&buffer, radius.value());
    let focus = calculate_focal_rect(buffer.dimensions());
    chroma::restore_focus(&mut blurred, &buffer, &focus);
    finish_edit(backend, blob, &blurred, "background blur")
}

// =========================================================================
// Metadata
// =========================================================================

/// Embedded camera/GPS tags, or the no-metadata marker.
#[instrument(skip(backend, blob), fields(file = %blob.name()))]
pub fn inspect(backend: &impl ImageBackend, blob: &ImageBlob) -> Result<MetadataReport> {
    backend.read_metadata(blob.bytes())
}

/// Drop every embedded tag block by round-tripping through pixels.
#[instrument(skip(backend, blob), fields(file = %blob.name(), size = blob.size()))]
pub fn strip_metadata(backend: &impl ImageBackend, blob: &ImageBlob) -> Result<ImageBlob> {
    let buffer = decode(backend, blob)?;
    finish_edit(backend, blob, &buffer, "metadata strip")
}
