//! Color adjustments and named filter presets.
//!
//! Each primitive is one of the canvas/CSS filter functions, expressed on
//! 0–255 channel values. A chain runs per pixel in `f32`, clamping after each
//! primitive and rounding once at the end; alpha is never touched. Blur steps
//! split the chain and go through the backend's convolution.

use super::backend::ImageBackend;
use super::buffer::PixelBuffer;
use super::params::{Adjustments, NamedFilter};

/// Per-pixel color primitive. Amounts are factors (`1.0` = 100%), hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Grayscale(f32),
    Sepia(f32),
    Invert(f32),
    HueRotate(f32),
}

/// One stage in a filter chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStep {
    Color(ColorOp),
    /// Gaussian blur with this radius in pixels.
    Blur(f32),
}

type Matrix = [[f32; 3]; 3];

impl ColorOp {
    fn apply(self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        match self {
            ColorOp::Brightness(a) => [r * a, g * a, b * a],
            ColorOp::Contrast(a) => {
                let c = |v: f32| (v - 127.5) * a + 127.5;
                [c(r), c(g), c(b)]
            }
            ColorOp::Invert(a) => {
                let a = a.clamp(0.0, 1.0);
                let inv = |v: f32| a * (255.0 - v) + (1.0 - a) * v;
                [inv(r), inv(g), inv(b)]
            }
            ColorOp::Saturate(s) => mul(&saturate_matrix(s), [r, g, b]),
            ColorOp::Grayscale(a) => mul(&grayscale_matrix(a.clamp(0.0, 1.0)), [r, g, b]),
            ColorOp::Sepia(a) => mul(&sepia_matrix(a.clamp(0.0, 1.0)), [r, g, b]),
            ColorOp::HueRotate(deg) => mul(&hue_rotate_matrix(deg), [r, g, b]),
        }
    }
}

fn mul(m: &Matrix, v: [f32; 3]) -> [f32; 3] {
    let row = |i: usize| m[i][0] * v[0] + m[i][1] * v[1] + m[i][2] * v[2];
    [row(0), row(1), row(2)]
}

fn saturate_matrix(s: f32) -> Matrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn grayscale_matrix(a: f32) -> Matrix {
    let s = 1.0 - a;
    [
        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
    ]
}

fn sepia_matrix(a: f32) -> Matrix {
    let s = 1.0 - a;
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Apply color primitives in order to every pixel.
pub fn apply_color_ops(buffer: &mut PixelBuffer, ops: &[ColorOp]) {
    if ops.is_empty() {
        return;
    }
    for px in buffer.pixels_mut() {
        let mut v = [px[0] as f32, px[1] as f32, px[2] as f32];
        for op in ops {
            v = op.apply(v).map(|c| c.clamp(0.0, 255.0));
        }
        px[0] = v[0].round() as u8;
        px[1] = v[1].round() as u8;
        px[2] = v[2].round() as u8;
    }
}

/// Steps for brightness → contrast → saturation, skipping identities.
pub fn adjustment_steps(adjustments: &Adjustments) -> Vec<FilterStep> {
    [
        ColorOp::Brightness(adjustments.brightness / 100.0),
        ColorOp::Contrast(adjustments.contrast / 100.0),
        ColorOp::Saturate(adjustments.saturation / 100.0),
    ]
    .into_iter()
    .filter(|op| {
        !matches!(
            op,
            ColorOp::Brightness(a) | ColorOp::Contrast(a) | ColorOp::Saturate(a) if *a == 1.0
        )
    })
    .map(FilterStep::Color)
    .collect()
}

/// Fixed composition for each preset.
pub fn filter_steps(filter: NamedFilter) -> Vec<FilterStep> {
    use ColorOp::*;
    use FilterStep::Color;
    match filter {
        NamedFilter::Grayscale => vec![Color(Grayscale(1.0))],
        NamedFilter::Sepia => vec![Color(Sepia(1.0))],
        NamedFilter::Blur => vec![FilterStep::Blur(5.0)],
        NamedFilter::Invert => vec![Color(Invert(1.0))],
        NamedFilter::HueRotate => vec![Color(HueRotate(90.0))],
        NamedFilter::Vintage => vec![
            Color(Sepia(0.5)),
            Color(Contrast(1.2)),
            Color(Brightness(0.9)),
        ],
        NamedFilter::Cold => vec![Color(HueRotate(180.0)), Color(Saturate(1.5))],
        NamedFilter::Warm => vec![Color(Sepia(0.3)), Color(Saturate(1.3))],
    }
}

/// Run a chain, batching consecutive color steps into one pixel pass.
pub fn run_filter_chain(
    backend: &impl ImageBackend,
    mut buffer: PixelBuffer,
    steps: &[FilterStep],
) -> PixelBuffer {
    let mut pending = Vec::new();
    for step in steps {
        match *step {
            FilterStep::Color(op) => pending.push(op),
            FilterStep::Blur(radius) => {
                apply_color_ops(&mut buffer, &pending);
                pending.clear();
                buffer = backend.blur(&buffer, radius);
            }
        }
    }
    apply_color_ops(&mut buffer, &pending);
    buffer
}
