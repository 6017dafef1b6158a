//! Text measurement and coverage rasterization for watermarks.
//!
//! Glyphs come from a single TrueType/OpenType face: the bundled DejaVu Sans,
//! or a file named in config. Family names other than the loaded face's are
//! not resolved against system fonts.

use super::backend::ImagingError;
use super::buffer::PixelBuffer;
use super::params::CssColor;
use fontdue::{Font, FontSettings};
use std::path::Path;

const BUNDLED_FACE: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BUNDLED_FAMILY: &str = "DejaVu Sans";

pub struct TextRasterizer {
    font: Font,
    family: String,
}

impl TextRasterizer {
    pub fn bundled() -> Self {
        let font = Font::from_bytes(BUNDLED_FACE, FontSettings::default())
            .expect("bundled DejaVuSans.ttf parses");
        Self {
            font,
            family: BUNDLED_FAMILY.to_string(),
        }
    }

    /// Load a face from disk. The family is taken from the file stem.
    pub fn from_file(path: &Path) -> Result<Self, ImagingError> {
        let bytes = std::fs::read(path)?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
            ImagingError::Validation(format!("font {}: {e}", path.display()))
        })?;
        let family = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| BUNDLED_FAMILY.to_string());
        Ok(Self { font, family })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Advance width of `text` at `px`, including pair kerning.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(left) = prev {
                width += self.font.horizontal_kern(left, ch, px).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, px).advance_width;
            prev = Some(ch);
        }
        width
    }

    /// Blend `text` onto `buffer` with its left edge at `origin.0` and the
    /// bottom of its em box at `origin.1`.
    pub fn draw(
        &self,
        buffer: &mut PixelBuffer,
        text: &str,
        origin: (f32, f32),
        px: f32,
        color: CssColor,
    ) {
        let descent = self
            .font
            .horizontal_line_metrics(px)
            .map(|m| m.descent)
            .unwrap_or(-px * 0.2);
        let baseline = origin.1 + descent;
        let (width, height) = (buffer.width() as i64, buffer.height() as i64);

        let mut cursor_x = origin.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(left) = prev {
                cursor_x += self.font.horizontal_kern(left, ch, px).unwrap_or(0.0);
            }
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            let gx = cursor_x.round() as i64 + metrics.xmin as i64;
            let gy = (baseline - (metrics.ymin as f32 + metrics.height as f32)).round() as i64;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    let (x, y) = (gx + col as i64, gy + row as i64);
                    if coverage == 0 || x < 0 || y < 0 || x >= width || y >= height {
                        continue;
                    }
                    let alpha = coverage as f32 / 255.0 * color.a;
                    let dst = buffer.pixel(x as u32, y as u32);
                    buffer.put_pixel(x as u32, y as u32, blend_over(dst, color.rgb(), alpha));
                }
            }

            cursor_x += metrics.advance_width;
            prev = Some(ch);
        }
    }
}

/// Source-over with straight alpha.
fn blend_over(dst: [u8; 4], src: [u8; 3], src_alpha: f32) -> [u8; 4] {
    let da = dst[3] as f32 / 255.0;
    let out_a = src_alpha + da * (1.0 - src_alpha);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mix = |s: u8, d: u8| {
        let v = (s as f32 * src_alpha + d as f32 * da * (1.0 - src_alpha)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_grows_with_text_and_size() {
        let text = TextRasterizer::bundled();
        let short = text.measure("ab", 48.0);
        let long = text.measure("abcd", 48.0);
        assert!(short > 0.0);
        assert!(long > short);
        assert!(text.measure("ab", 96.0) > short * 1.9);
        assert_eq!(text.measure("", 48.0), 0.0);
    }

    #[test]
    fn draw_stays_above_bottom_edge() {
        let text = TextRasterizer::bundled();
        let mut buf = PixelBuffer::filled(200, 80, [0, 0, 0, 255]);
        text.draw(&mut buf, "Hg", (10.0, 70.0), 40.0, CssColor::opaque(255, 255, 255));

        let lit: Vec<(u32, u32)> = (0..80)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| buf.pixel(x, y)[0] > 0)
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(_, y)| y < 70));
        assert!(lit.iter().all(|&(x, _)| x >= 10));
    }

    #[test]
    fn draw_clips_outside_canvas() {
        let text = TextRasterizer::bundled();
        let mut buf = PixelBuffer::filled(10, 10, [0, 0, 0, 255]);
        text.draw(&mut buf, "WWWW", (-50.0, 5.0), 48.0, CssColor::opaque(255, 0, 0));
        assert_eq!(buf.dimensions(), (10, 10));
    }

    #[test]
    fn blend_half_white_over_black() {
        assert_eq!(blend_over([0, 0, 0, 255], [255, 255, 255], 0.5), [128, 128, 128, 255]);
    }

    #[test]
    fn blend_over_transparent_keeps_source_color() {
        assert_eq!(blend_over([0, 0, 0, 0], [255, 0, 0], 0.5), [255, 0, 0, 128]);
    }

    #[test]
    fn missing_font_file_is_io_error() {
        let err = TextRasterizer::from_file(Path::new("/nonexistent/face.ttf")).err();
        assert!(matches!(err, Some(ImagingError::Io(_))));
    }
}
