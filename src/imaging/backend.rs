//! Raster backend trait and the pipeline's error taxonomy.
//!
//! The [`ImageBackend`] trait is the canvas capability set every operation is
//! written against: decode, encode, scale-blit, blur, text measurement and
//! drawing, plus embedded-tag reading. Everything else (chroma keying, color
//! matrices, flips, crops, rotation geometry) is plain pixel math on a
//! [`PixelBuffer`] and lives outside the trait.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on `image`,
//! `imageproc`, `fontdue` and `kamadak-exif`.

use super::blob::TargetFormat;
use super::buffer::PixelBuffer;
use super::exif_parser::MetadataReport;
use super::params::{CssColor, FontSpec, Quality};
use thiserror::Error;

/// The one error a pipeline operation can reject with.
///
/// Every variant renders as a message naming what failed and why, so callers
/// can surface it to a user verbatim.
#[derive(Error, Debug)]
pub enum ImagingError {
    /// Input bytes are not a supported raster format, or are truncated.
    #[error("failed to load image: {0}")]
    Decode(String),
    /// The encoder produced no output for this buffer/format/quality.
    #[error("{operation} failed: {reason}")]
    Encode {
        operation: &'static str,
        reason: String,
    },
    /// A requested rectangle falls outside the source's pixel extent.
    #[error("out of bounds: {0}")]
    Bounds(String),
    /// A parameter is outside its documented domain.
    #[error("invalid parameter: {0}")]
    Validation(String),
    /// An unrecognized top-level operation was dispatched.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// A tag block exists but could not be parsed.
    #[error("failed to extract metadata: {0}")]
    Metadata(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImagingError {
    /// Attribute an encode failure to the high-level operation that caused it.
    ///
    /// Backends only know they were asked to encode; the operation layer knows
    /// whether that was a rotate, a compress or a watermark.
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            ImagingError::Encode { reason, .. } => ImagingError::Encode { operation, reason },
            other => other,
        }
    }
}

/// Trait for raster backends.
///
/// Implementations hold no per-call state: every method is a pure function of
/// its arguments, so one backend can serve concurrent batch items.
pub trait ImageBackend: Sync {
    /// Decode an encoded blob into an RGBA buffer at its natural size.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImagingError>;

    /// Serialize a buffer. `quality` only matters for lossy formats.
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: TargetFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, ImagingError>;

    /// Scale-blit the whole buffer onto a `width`×`height` surface.
    fn scale(&self, buffer: &PixelBuffer, width: u32, height: u32) -> PixelBuffer;

    /// Gaussian blur with the given standard deviation in pixels.
    fn blur(&self, buffer: &PixelBuffer, radius: f32) -> PixelBuffer;

    /// Advance width of `text` rendered at `font`, in pixels.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32;

    /// Draw `text` with its bottom edge at `origin.1` and left edge at `origin.0`.
    fn draw_text(
        &self,
        buffer: &mut PixelBuffer,
        text: &str,
        origin: (f32, f32),
        font: &FontSpec,
        color: CssColor,
    );

    /// Parse embedded camera/GPS tags.
    fn read_metadata(&self, bytes: &[u8]) -> Result<MetadataReport, ImagingError>;
}
