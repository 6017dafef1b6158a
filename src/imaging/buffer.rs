//! Decoded RGBA pixel grid.

use super::backend::ImagingError;
use image::{Rgba, RgbaImage};

/// Row-major 8-bit RGBA raster.
///
/// Channel values are `u8`, so every write is already clamped to 0–255;
/// floating-point stages clamp before narrowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    /// Wrap raw RGBA bytes; the length must be exactly `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImagingError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ImagingError::Validation(format!(
                "pixel data is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or_else(|| ImagingError::Validation("pixel data does not fit dimensions".into()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        self.image.put_pixel(x, y, Rgba(rgba));
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Mutable view of every pixel as 4-byte chunks.
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.image.chunks_exact_mut(4)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
