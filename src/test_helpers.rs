//! Shared test utilities for the pixelkit test suite.
//!
//! Builds synthetic buffers and encoded blobs directly with the `image`
//! crate, so fixtures never depend on the backend under test.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let blob = png_blob(&subject_on_white(40, 30), "portrait.png");
//! let exif_jpeg = jpeg_with_exif();
//! ```

use crate::imaging::{ImageBlob, PixelBuffer};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

// =========================================================================
// Buffers
// =========================================================================

/// Opaque buffer where neighbouring pixels differ.
pub fn gradient_buffer(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            buf.put_pixel(
                x,
                y,
                [
                    ((x * 37 + y * 11) % 256) as u8,
                    ((x * 5 + y * 71) % 256) as u8,
                    ((x * y) % 256) as u8,
                    255,
                ],
            );
        }
    }
    buf
}

/// White background with a dark navy rectangle over the middle half.
pub fn subject_on_white(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::filled(width, height, [255, 255, 255, 255]);
    for y in height / 4..height * 3 / 4 {
        for x in width / 4..width * 3 / 4 {
            buf.put_pixel(x, y, [20, 30, 90, 255]);
        }
    }
    buf
}

// =========================================================================
// Encoded blobs
// =========================================================================

fn encode_with(buffer: &PixelBuffer, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(buffer.as_image().clone());
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), format).unwrap();
    out
}

pub fn encode_png(buffer: &PixelBuffer) -> Vec<u8> {
    encode_with(buffer, ImageFormat::Png)
}

pub fn encode_jpeg(buffer: &PixelBuffer) -> Vec<u8> {
    encode_with(buffer, ImageFormat::Jpeg)
}

pub fn png_blob(buffer: &PixelBuffer, name: &str) -> ImageBlob {
    ImageBlob::new(encode_png(buffer), "image/png", name)
}

pub fn jpeg_blob(buffer: &PixelBuffer, name: &str) -> ImageBlob {
    ImageBlob::new(encode_jpeg(buffer), "image/jpeg", name)
}

// =========================================================================
// EXIF fixture
// =========================================================================

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

/// Little-endian TIFF block: Make, Model, Orientation = 6 and a GPS IFD at
/// 48°51'29.88"N 2°17'40.2"W.
pub fn exif_tiff_block() -> Vec<u8> {
    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;
    const MAKE: &[u8] = b"Pixelkit\0";
    const MODEL: &[u8] = b"Test Camera\0";

    let mut t = Vec::new();
    t.extend_from_slice(b"II");
    t.extend_from_slice(&42u16.to_le_bytes());
    t.extend_from_slice(&8u32.to_le_bytes());

    // IFD0: 2 + 4 * 12 + 4 bytes, ending at 62
    t.extend_from_slice(&4u16.to_le_bytes());
    ifd_entry(&mut t, 0x010F, ASCII, MAKE.len() as u32, 62u32.to_le_bytes());
    ifd_entry(&mut t, 0x0110, ASCII, MODEL.len() as u32, 72u32.to_le_bytes());
    ifd_entry(&mut t, 0x0112, SHORT, 1, [6, 0, 0, 0]);
    ifd_entry(&mut t, 0x8825, LONG, 1, 84u32.to_le_bytes());
    t.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(t.len(), 62);

    t.extend_from_slice(MAKE);
    t.push(0);
    t.extend_from_slice(MODEL);
    assert_eq!(t.len(), 84);

    // GPS IFD, ending at 138, then two rational triplets
    t.extend_from_slice(&4u16.to_le_bytes());
    ifd_entry(&mut t, 0x0001, ASCII, 2, *b"N\0\0\0");
    ifd_entry(&mut t, 0x0002, RATIONAL, 3, 138u32.to_le_bytes());
    ifd_entry(&mut t, 0x0003, ASCII, 2, *b"W\0\0\0");
    ifd_entry(&mut t, 0x0004, RATIONAL, 3, 162u32.to_le_bytes());
    t.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(t.len(), 138);

    for (num, den) in [(48u32, 1u32), (51, 1), (2988, 100), (2, 1), (17, 1), (402, 10)] {
        t.extend_from_slice(&num.to_le_bytes());
        t.extend_from_slice(&den.to_le_bytes());
    }
    t
}

/// An 8x4 JPEG carrying [`exif_tiff_block`] in an APP1 segment right after SOI.
pub fn jpeg_with_exif() -> Vec<u8> {
    let jpeg = encode_jpeg(&gradient_buffer(8, 4));
    let tiff = exif_tiff_block();

    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}
