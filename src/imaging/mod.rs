//! Image transform pipeline: pure Rust, no system libraries.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` codecs (JPEG, PNG, WebP, GIF, BMP; TIFF read-only) |
//! | **Scale / blur** | `image::imageops::{resize, blur}` |
//! | **Rotate (off-axis)** | `imageproc` bilinear `warp_into` |
//! | **Watermark text** | `fontdue` glyph coverage |
//! | **EXIF** | `kamadak-exif` |
//! | **PDF export** | `lopdf` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Validated data structures describing each operation
//! - **Pixel engines**: color matrices, chroma keying, flips/crops/rotation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: One function per pipeline stage, blob in, blob out

pub mod backend;
mod blob;
mod buffer;
mod calculations;
pub mod chroma;
pub mod color;
mod document;
pub mod exif_parser;
pub mod geometry;
pub mod operations;
mod params;
pub mod rust_backend;
mod text;

pub use backend::{ImageBackend, ImagingError};
pub use blob::{
    DocumentBlob, Exported, ImageBlob, PageOrientation, TargetFormat, extension_for_mime,
    mime_for_extension, mime_for_format,
};
pub use buffer::PixelBuffer;
pub use calculations::{
    calculate_fit_within, calculate_focal_rect, calculate_percentage_dimensions,
    calculate_resize_dimensions, calculate_rotated_dimensions, calculate_watermark_origin,
    check_canvas, check_crop_bounds, page_orientation,
};
pub use exif_parser::{MetadataRecord, MetadataReport, TagValue, format_metadata};
pub use params::{
    Adjustments, BlurRadius, CropRect, CssColor, FlipAxis, FontSpec, Limits, NamedFilter,
    Percent, Quality, ResizeParams, Tolerance, WatermarkOptions, WatermarkPosition,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
