//! Flip, crop and rotate on decoded buffers.
//!
//! Scaling needs a resampling filter and so goes through the backend; these
//! transforms are exact pixel permutations except for off-axis rotation,
//! which resamples bilinearly onto a canvas grown to hold every corner.

use super::backend::ImagingError;
use super::buffer::PixelBuffer;
use super::calculations::{calculate_rotated_dimensions, check_crop_bounds};
use super::params::{CropRect, FlipAxis};
use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::debug;

/// Mirror across the vertical (`Horizontal`) or horizontal (`Vertical`) centerline.
pub fn flip(buffer: &PixelBuffer, axis: FlipAxis) -> PixelBuffer {
    let image = buffer.as_image();
    PixelBuffer::from_image(match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(image),
        FlipAxis::Vertical => imageops::flip_vertical(image),
    })
}

/// Extract `rect`; fails unless the rectangle lies fully inside the source.
pub fn crop(buffer: &PixelBuffer, rect: &CropRect) -> Result<PixelBuffer, ImagingError> {
    check_crop_bounds(buffer.dimensions(), rect)?;
    let view = imageops::crop_imm(buffer.as_image(), rect.x, rect.y, rect.width, rect.height);
    Ok(PixelBuffer::from_image(view.to_image()))
}

/// Rotate clockwise by `degrees` around the image center.
///
/// Multiples of 90° are lossless. Any other angle enlarges the canvas to
/// `w·|cos θ| + h·|sin θ|` by `w·|sin θ| + h·|cos θ|` and leaves the
/// uncovered corners transparent.
pub fn rotate(buffer: &PixelBuffer, degrees: f64) -> PixelBuffer {
    let image = buffer.as_image();
    let turn = degrees.rem_euclid(360.0);
    if turn == 0.0 {
        return buffer.clone();
    } else if turn == 90.0 {
        return PixelBuffer::from_image(imageops::rotate90(image));
    } else if turn == 180.0 {
        return PixelBuffer::from_image(imageops::rotate180(image));
    } else if turn == 270.0 {
        return PixelBuffer::from_image(imageops::rotate270(image));
    }

    let (w, h) = buffer.dimensions();
    let (out_w, out_h) = calculate_rotated_dimensions((w, h), degrees);
    debug!(degrees, from = ?(w, h), to = ?(out_w, out_h), "resampling rotation");

    // Pixel (i, j) sits at integer coordinates, so centers are at (n - 1) / 2.
    let src_center = ((w as f32 - 1.0) / 2.0, (h as f32 - 1.0) / 2.0);
    let dst_center = ((out_w as f32 - 1.0) / 2.0, (out_h as f32 - 1.0) / 2.0);
    let projection = Projection::translate(dst_center.0, dst_center.1)
        * Projection::rotate(degrees.to_radians() as f32)
        * Projection::translate(-src_center.0, -src_center.1);

    let mut out = RgbaImage::new(out_w, out_h);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut out,
    );
    PixelBuffer::from_image(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_buffer;

    // =========================================================================
    // flip
    // =========================================================================

    #[test]
    fn flip_horizontal_mirrors_columns() {
        let buf = gradient_buffer(4, 3);
        let out = flip(&buf, FlipAxis::Horizontal);
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.pixel(0, 1), buf.pixel(3, 1));
        assert_eq!(out.pixel(3, 2), buf.pixel(0, 2));
    }

    #[test]
    fn flip_vertical_mirrors_rows() {
        let buf = gradient_buffer(4, 3);
        let out = flip(&buf, FlipAxis::Vertical);
        assert_eq!(out.pixel(1, 0), buf.pixel(1, 2));
    }

    #[test]
    fn flip_twice_is_identity() {
        let buf = gradient_buffer(7, 5);
        for axis in [FlipAxis::Horizontal, FlipAxis::Vertical] {
            assert_eq!(flip(&flip(&buf, axis), axis), buf);
        }
    }

    // =========================================================================
    // crop
    // =========================================================================

    #[test]
    fn crop_extracts_subrectangle() {
        let buf = gradient_buffer(10, 8);
        let rect = CropRect {
            x: 2,
            y: 3,
            width: 4,
            height: 5,
        };
        let out = crop(&buf, &rect).unwrap();
        assert_eq!(out.dimensions(), (4, 5));
        assert_eq!(out.pixel(0, 0), buf.pixel(2, 3));
        assert_eq!(out.pixel(3, 4), buf.pixel(5, 7));
    }

    #[test]
    fn crop_outside_is_bounds_error() {
        let buf = gradient_buffer(10, 8);
        let rect = CropRect {
            x: 8,
            y: 0,
            width: 4,
            height: 2,
        };
        assert!(matches!(crop(&buf, &rect), Err(ImagingError::Bounds(_))));
    }

    // =========================================================================
    // rotate
    // =========================================================================

    #[test]
    fn rotate_90_is_clockwise() {
        let buf = gradient_buffer(4, 2);
        let out = rotate(&buf, 90.0);
        assert_eq!(out.dimensions(), (2, 4));
        // top-left of the source ends up top-right
        assert_eq!(out.pixel(1, 0), buf.pixel(0, 0));
        // bottom-left of the source ends up top-left
        assert_eq!(out.pixel(0, 0), buf.pixel(0, 1));
    }

    #[test]
    fn rotate_negative_quarter_matches_270() {
        let buf = gradient_buffer(5, 3);
        assert_eq!(rotate(&buf, -90.0), rotate(&buf, 270.0));
    }

    #[test]
    fn rotate_180_twice_is_identity() {
        let buf = gradient_buffer(6, 4);
        assert_eq!(rotate(&rotate(&buf, 180.0), 180.0), buf);
    }

    #[test]
    fn rotate_full_turn_is_identity() {
        let buf = gradient_buffer(3, 3);
        assert_eq!(rotate(&buf, 360.0), buf);
    }

    #[test]
    fn rotate_45_grows_canvas_with_transparent_corners() {
        let buf = PixelBuffer::filled(20, 20, [200, 10, 10, 255]);
        let out = rotate(&buf, 45.0);
        assert_eq!(out.dimensions(), (29, 29));
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(28, 28)[3], 0);
        let center = out.pixel(14, 14);
        let expected = [200u8, 10, 10, 255];
        for (got, want) in center.iter().zip(expected) {
            assert!(got.abs_diff(want) <= 1, "{center:?}");
        }
    }
}
