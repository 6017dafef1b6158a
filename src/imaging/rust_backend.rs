//! Pure Rust raster backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, BMP, TIFF) | `image` decoders, EXIF orientation applied |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, alpha flattened onto black |
//! | Encode → PNG | `PngEncoder` |
//! | Encode → WebP | `WebPEncoder::new_lossless`, RGB snapped to fewer levels below full quality |
//! | Encode → GIF / BMP | `DynamicImage::write_to` |
//! | Scale | `image::imageops::resize` with `Lanczos3` filter |
//! | Blur | `image::imageops::blur` (Gaussian, sigma = radius) |
//! | Text | `fontdue` via [`TextRasterizer`] |
//! | EXIF | `kamadak-exif` via [`exif_parser`](super::exif_parser) |

use super::backend::{ImageBackend, ImagingError};
use super::blob::TargetFormat;
use super::buffer::PixelBuffer;
use super::exif_parser::{self, MetadataReport};
use super::params::{CssColor, FontSpec, Quality};
use super::text::TextRasterizer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader,
    RgbImage, imageops,
};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    text: TextRasterizer,
}

impl RustBackend {
    /// Backend drawing text with the bundled DejaVu Sans face.
    pub fn new() -> Self {
        Self {
            text: TextRasterizer::bundled(),
        }
    }

    /// Backend drawing text with the face at `path`.
    pub fn with_font_file(path: &Path) -> Result<Self, ImagingError> {
        Ok(Self {
            text: TextRasterizer::from_file(path)?,
        })
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(e: impl std::fmt::Display) -> ImagingError {
    ImagingError::Decode(e.to_string())
}

fn encode_error(e: impl std::fmt::Display) -> ImagingError {
    ImagingError::Encode {
        operation: "encode",
        reason: e.to_string(),
    }
}

/// JPEG has no alpha channel: composite onto opaque black first.
fn flatten_on_black(buffer: &PixelBuffer) -> RgbImage {
    let (w, h) = buffer.dimensions();
    let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
    for px in buffer.as_raw().chunks_exact(4) {
        let alpha = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * alpha + 127) / 255) as u8);
        }
    }
    RgbImage::from_raw(w, h, rgb).unwrap_or_else(|| RgbImage::new(w, h))
}

/// Number of evenly spaced levels per RGB channel for a WebP quality.
///
/// Quadratic in quality: `2` at the bottom, all `256` at full quality.
fn webp_levels(quality: Quality) -> u16 {
    let q = quality.value().clamp(0.0, 1.0);
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}

/// RGBA bytes for the lossless WebP encoder. Below full quality the color
/// channels are snapped to [`webp_levels`] steps so the encoder finds longer
/// runs; alpha is never touched.
fn quantize_for_webp(buffer: &PixelBuffer, quality: Quality) -> Cow<'_, [u8]> {
    let levels = webp_levels(quality);
    if levels >= 256 {
        return Cow::Borrowed(buffer.as_raw());
    }
    let step = 255.0 / f32::from(levels - 1);
    let mut data = buffer.as_raw().to_vec();
    for px in data.chunks_exact_mut(4) {
        for channel in &mut px[..3] {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
    Cow::Owned(data)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImagingError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(decode_error)?
            .into_decoder()
            .map_err(decode_error)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        image.apply_orientation(orientation);
        debug!(
            width = image.width(),
            height = image.height(),
            ?orientation,
            "decoded"
        );
        Ok(PixelBuffer::from_image(image.into_rgba8()))
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: TargetFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, ImagingError> {
        let (w, h) = buffer.dimensions();
        let mut out = Vec::new();
        match format {
            TargetFormat::Jpeg => {
                let rgb = flatten_on_black(buffer);
                JpegEncoder::new_with_quality(&mut out, quality.percent())
                    .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                    .map_err(encode_error)?;
            }
            TargetFormat::Png => {
                PngEncoder::new(&mut out)
                    .write_image(buffer.as_raw(), w, h, ExtendedColorType::Rgba8)
                    .map_err(encode_error)?;
            }
            TargetFormat::Webp => {
                let pixels = quantize_for_webp(buffer, quality);
                WebPEncoder::new_lossless(&mut out)
                    .write_image(&pixels, w, h, ExtendedColorType::Rgba8)
                    .map_err(encode_error)?;
            }
            TargetFormat::Gif | TargetFormat::Bmp => {
                DynamicImage::ImageRgba8(buffer.as_image().clone())
                    .write_to(&mut Cursor::new(&mut out), format.image_format())
                    .map_err(encode_error)?;
            }
        }
        if out.is_empty() {
            return Err(encode_error("encoder produced no output"));
        }
        Ok(out)
    }

    fn scale(&self, buffer: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_image(imageops::resize(
            buffer.as_image(),
            width,
            height,
            FilterType::Lanczos3,
        ))
    }

    fn blur(&self, buffer: &PixelBuffer, radius: f32) -> PixelBuffer {
        PixelBuffer::from_image(imageops::blur(buffer.as_image(), radius))
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        self.text.measure(text, font.size_px)
    }

    fn draw_text(
        &self,
        buffer: &mut PixelBuffer,
        text: &str,
        origin: (f32, f32),
        font: &FontSpec,
        color: CssColor,
    ) {
        if !font.family.eq_ignore_ascii_case(self.text.family()) {
            debug!(
                requested = %font.family,
                using = self.text.family(),
                "font family substituted"
            );
        }
        self.text.draw(buffer, text, origin, font.size_px, color);
    }

    fn read_metadata(&self, bytes: &[u8]) -> Result<MetadataReport, ImagingError> {
        exif_parser::read_exif(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_buffer, jpeg_blob, jpeg_with_exif};

    fn roundtrip(buffer: &PixelBuffer, format: TargetFormat) -> PixelBuffer {
        let backend = RustBackend::new();
        let bytes = backend.encode(buffer, format, Quality::MAX).unwrap();
        backend.decode(&bytes).unwrap()
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for ext in ["jpg", "jpeg", "png", "webp", "gif", "bmp"] {
            assert!(exts.contains(&ext), "missing {ext}");
        }
    }

    // =========================================================================
    // decode / encode
    // =========================================================================

    #[test]
    fn decode_garbage_is_decode_error() {
        let err = RustBackend::new().decode(b"\x00\x01not an image").unwrap_err();
        assert!(matches!(err, ImagingError::Decode(_)));
    }

    #[test]
    fn decode_truncated_png_is_decode_error() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&gradient_buffer(16, 16), TargetFormat::Png, Quality::MAX)
            .unwrap();
        let err = backend.decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ImagingError::Decode(_)));
    }

    #[test]
    fn lossless_formats_roundtrip_exactly() {
        let buf = gradient_buffer(13, 7);
        for format in [TargetFormat::Png, TargetFormat::Webp, TargetFormat::Bmp] {
            assert_eq!(roundtrip(&buf, format), buf, "{format}");
        }
    }

    #[test]
    fn jpeg_roundtrip_is_close() {
        let buf = PixelBuffer::filled(16, 16, [120, 60, 200, 255]);
        let out = roundtrip(&buf, TargetFormat::Jpeg);
        assert_eq!(out.dimensions(), (16, 16));
        let px = out.pixel(8, 8);
        for (got, want) in px.iter().zip([120u8, 60, 200, 255]) {
            assert!(got.abs_diff(want) <= 4, "{px:?}");
        }
    }

    #[test]
    fn jpeg_flattens_transparency_onto_black() {
        let buf = PixelBuffer::filled(8, 8, [255, 255, 255, 0]);
        let px = roundtrip(&buf, TargetFormat::Jpeg).pixel(4, 4);
        assert!(px[0] < 5 && px[1] < 5 && px[2] < 5, "{px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn jpeg_size_grows_with_quality() {
        let backend = RustBackend::new();
        let buf = gradient_buffer(64, 64);
        let sizes: Vec<usize> = [0.1, 0.5, 0.9, 1.0]
            .iter()
            .map(|&q| {
                backend
                    .encode(&buf, TargetFormat::Jpeg, Quality::new(q).unwrap())
                    .unwrap()
                    .len()
            })
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "{sizes:?}");
    }

    #[test]
    fn webp_levels_follow_quality() {
        let levels = |q: f32| webp_levels(Quality::new(q).unwrap());
        assert_eq!(levels(0.0), 2);
        assert_eq!(levels(0.5), 66);
        assert_eq!(levels(0.8), 165);
        assert_eq!(levels(1.0), 256);
    }

    #[test]
    fn webp_full_quality_is_lossless() {
        let buf = gradient_buffer(24, 18);
        assert_eq!(roundtrip(&buf, TargetFormat::Webp), buf);
    }

    #[test]
    fn webp_low_quality_snaps_color_but_keeps_alpha() {
        let mut buf = gradient_buffer(16, 16);
        buf.put_pixel(3, 3, [90, 140, 200, 77]);
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&buf, TargetFormat::Webp, Quality::new(0.0).unwrap())
            .unwrap();
        let out = backend.decode(&bytes).unwrap();
        for px in out.as_raw().chunks_exact(4) {
            assert!(px[..3].iter().all(|c| *c == 0 || *c == 255), "{px:?}");
        }
        assert_eq!(out.pixel(3, 3)[3], 77);
        assert_eq!(out.pixel(0, 0)[3], 255);
    }

    #[test]
    fn gif_encodes_and_decodes() {
        let buf = PixelBuffer::filled(5, 3, [0, 255, 0, 255]);
        let out = roundtrip(&buf, TargetFormat::Gif);
        assert_eq!(out.dimensions(), (5, 3));
    }

    #[test]
    fn decode_applies_exif_orientation() {
        // fixture is 8x4 with Orientation = 6 (rotate 90 CW)
        let buf = RustBackend::new().decode(&jpeg_with_exif()).unwrap();
        assert_eq!(buf.dimensions(), (4, 8));
    }

    // =========================================================================
    // scale / blur
    // =========================================================================

    #[test]
    fn plain_jpeg_reports_no_metadata() {
        let blob = jpeg_blob(&gradient_buffer(6, 6), "plain.jpg");
        assert_eq!(
            RustBackend::new().read_metadata(blob.bytes()).unwrap(),
            MetadataReport::NoMetadata
        );
    }

    #[test]
    fn scale_produces_requested_size() {
        let out = RustBackend::new().scale(&gradient_buffer(100, 50), 40, 20);
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn blur_keeps_size_and_softens_edges() {
        let mut buf = PixelBuffer::filled(20, 20, [0, 0, 0, 255]);
        for y in 0..20 {
            for x in 10..20 {
                buf.put_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        let out = RustBackend::new().blur(&buf, 3.0);
        assert_eq!(out.dimensions(), (20, 20));
        let edge = out.pixel(10, 10)[0];
        assert!(edge > 0 && edge < 255, "edge {edge}");
    }

    // =========================================================================
    // text
    // =========================================================================

    #[test]
    fn text_measure_and_draw() {
        let backend = RustBackend::new();
        let font = FontSpec {
            size_px: 24.0,
            family: "Arial".into(),
        };
        assert!(backend.measure_text("pixel", &font) > 0.0);

        let mut buf = PixelBuffer::filled(120, 40, [0, 0, 0, 255]);
        backend.draw_text(&mut buf, "pixel", (5.0, 35.0), &font, CssColor::opaque(255, 255, 255));
        assert!(buf.as_raw().chunks(4).any(|px| px[0] > 0));
    }
}
