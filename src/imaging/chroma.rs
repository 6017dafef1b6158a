//! Corner-sampled chroma keying.
//!
//! The reference color is always pixel (0,0). A pixel is background when the
//! Manhattan distance over RGB to that reference is strictly below the
//! tolerance; alpha and position play no part. Works best on solid,
//! uniform backgrounds.

use super::buffer::PixelBuffer;
use super::params::CropRect;

/// RGB of the top-left pixel.
pub fn sample_background(buffer: &PixelBuffer) -> [u8; 3] {
    let [r, g, b, _] = buffer.pixel(0, 0);
    [r, g, b]
}

/// `|ΔR| + |ΔG| + |ΔB| < tolerance`.
pub fn is_background(px: &[u8], reference: [u8; 3], tolerance: u32) -> bool {
    let distance: u32 = px[..3]
        .iter()
        .zip(reference)
        .map(|(&c, r)| c.abs_diff(r) as u32)
        .sum();
    distance < tolerance
}

/// Number of pixels classified as background.
pub fn count_background(buffer: &PixelBuffer, tolerance: u32) -> usize {
    let reference = sample_background(buffer);
    buffer
        .as_raw()
        .chunks_exact(4)
        .filter(|px| is_background(px, reference, tolerance))
        .count()
}

/// Zero the alpha of every background pixel. Returns how many were cleared.
pub fn punch_out(buffer: &mut PixelBuffer, tolerance: u32) -> usize {
    let reference = sample_background(buffer);
    let mut cleared = 0;
    for px in buffer.pixels_mut() {
        if is_background(px, reference, tolerance) {
            px[3] = 0;
            cleared += 1;
        }
    }
    cleared
}

/// Paint the source over an opaque `color` fill, then recolor background
/// pixels of the composite.
///
/// The reference is sampled from the composite, so a transparent corner
/// reads as `color` itself.
pub fn replace_background(source: &PixelBuffer, color: [u8; 3], tolerance: u32) -> PixelBuffer {
    let mut composite = source.clone();
    for px in composite.pixels_mut() {
        let alpha = px[3] as u32;
        for (c, fill) in px[..3].iter_mut().zip(color) {
            *c = ((*c as u32 * alpha + fill as u32 * (255 - alpha) + 127) / 255) as u8;
        }
        px[3] = 255;
    }

    let reference = sample_background(&composite);
    for px in composite.pixels_mut() {
        if is_background(px, reference, tolerance) {
            px[..3].copy_from_slice(&color);
        }
    }
    composite
}

/// Copy `rect` from `sharp` into `blurred`, leaving the rest blurred.
pub fn restore_focus(blurred: &mut PixelBuffer, sharp: &PixelBuffer, rect: &CropRect) {
    let x_end = (rect.x + rect.width).min(sharp.width()).min(blurred.width());
    let y_end = (rect.y + rect.height).min(sharp.height()).min(blurred.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            blurred.put_pixel(x, y, sharp.pixel(x, y));
        }
    }
}
