//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how*. Every constructor validates
//! its domain and fails fast with [`ImagingError::Validation`]; nothing here
//! silently clamps a caller's value. The two documented lenient lookups
//! (watermark position and named filters) return a default instead of an
//! error and say so in their docs.
//!
//! ## Types
//!
//! - [`Quality`]: encoder quality factor in `0.0..=1.0`.
//! - [`Limits`]: configured ranges for tolerance, blur radius and percentage.
//! - [`Tolerance`], [`BlurRadius`], [`Percent`]: range-checked scalars.
//! - [`ResizeParams`], [`CropRect`], [`FlipAxis`], [`Adjustments`]: edit parameters.
//! - [`CssColor`], [`FontSpec`], [`WatermarkPosition`], [`WatermarkOptions`]: text overlay.

use super::backend::ImagingError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Quality factor for lossy encoding, `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Lossless-intent re-encode used by convert, strip and geometric edits.
    pub const MAX: Quality = Quality(1.0);

    pub fn new(value: f32) -> Result<Self, ImagingError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ImagingError::Validation(format!(
                "quality {value} must be between 0.0 and 1.0"
            )));
        }
        Ok(Self(value))
    }

    /// Build from the 1–100 scale used on the command line and in config.
    pub fn from_percent(percent: u32) -> Result<Self, ImagingError> {
        if !(1..=100).contains(&percent) {
            return Err(ImagingError::Validation(format!(
                "quality {percent} must be between 1 and 100"
            )));
        }
        Ok(Self(percent as f32 / 100.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Encoder setting on the 1–100 scale. A factor of 0.0 still encodes at 1.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.8)
    }
}

/// Configured parameter ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Smallest accepted chroma tolerance.
    pub tolerance_min: u32,
    /// Largest accepted chroma tolerance.
    pub tolerance_max: u32,
    /// Smallest accepted background blur radius, in pixels.
    pub blur_min: f32,
    /// Largest accepted background blur radius, in pixels.
    pub blur_max: f32,
    /// Upper bound for percentage resize.
    pub percent_max: f64,
    /// Input size ceiling in megabytes, enforced by the caller before decoding.
    pub max_file_size_mb: u64,
    /// Largest width or height any operation may produce.
    pub max_dimension: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tolerance_min: 10,
            tolerance_max: 100,
            blur_min: 5.0,
            blur_max: 50.0,
            percent_max: 1000.0,
            max_file_size_mb: 50,
            max_dimension: 16384,
        }
    }
}

/// Manhattan RGB distance threshold for background classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance(u32);

impl Tolerance {
    pub fn new(value: u32, limits: &Limits) -> Result<Self, ImagingError> {
        if value < limits.tolerance_min || value > limits.tolerance_max {
            return Err(ImagingError::Validation(format!(
                "tolerance {value} outside {}..={}",
                limits.tolerance_min, limits.tolerance_max
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Gaussian radius for background blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurRadius(f32);

impl BlurRadius {
    pub fn new(value: f32, limits: &Limits) -> Result<Self, ImagingError> {
        if !(limits.blur_min..=limits.blur_max).contains(&value) {
            return Err(ImagingError::Validation(format!(
                "blur radius {value} outside {}..={}",
                limits.blur_min, limits.blur_max
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Scale factor for percentage resize. 100 leaves dimensions unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64, limits: &Limits) -> Result<Self, ImagingError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ImagingError::Validation(format!(
                "percentage {value} must be greater than zero"
            )));
        }
        if value > limits.percent_max {
            return Err(ImagingError::Validation(format!(
                "percentage {value} exceeds maximum {}",
                limits.percent_max
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Absolute resize target.
///
/// With `maintain_aspect`, a missing dimension is derived from the source
/// ratio and a supplied height is ignored whenever width is also supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect: bool,
}

impl ResizeParams {
    pub fn validate(&self) -> Result<(), ImagingError> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ImagingError::Validation(
                "resize dimensions must be positive".into(),
            ));
        }
        match (self.width, self.height, self.maintain_aspect) {
            (None, None, _) => Err(ImagingError::Validation(
                "resize needs a width or a height".into(),
            )),
            (Some(_), Some(_), _) | (_, _, true) => Ok(()),
            _ => Err(ImagingError::Validation(
                "both width and height are required without aspect lock".into(),
            )),
        }
    }
}

/// Sub-rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Mirror axis, named the way canvas tools name them: `horizontal` mirrors
/// left-right across the vertical centerline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl FromStr for FlipAxis {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(ImagingError::Validation(format!(
                "flip axis must be horizontal or vertical, got {other:?}"
            ))),
        }
    }
}

/// Brightness/contrast/saturation as percentages, 100 = identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Adjustments {
    pub const MAX: f32 = 200.0;

    pub fn validate(&self) -> Result<(), ImagingError> {
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if !(0.0..=Self::MAX).contains(&value) {
                return Err(ImagingError::Validation(format!(
                    "{name} {value} outside 0..={}",
                    Self::MAX
                )));
            }
        }
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 100.0 && self.contrast == 100.0 && self.saturation == 100.0
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
        }
    }
}

/// Stylistic filter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedFilter {
    Grayscale,
    Sepia,
    Blur,
    Invert,
    HueRotate,
    Vintage,
    Cold,
    Warm,
}

impl NamedFilter {
    /// Case-insensitive lookup. Unknown names yield `None`, which callers
    /// treat as the identity filter.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "grayscale" => Some(Self::Grayscale),
            "sepia" => Some(Self::Sepia),
            "blur" => Some(Self::Blur),
            "invert" => Some(Self::Invert),
            "hue-rotate" => Some(Self::HueRotate),
            "vintage" => Some(Self::Vintage),
            "cold" => Some(Self::Cold),
            "warm" => Some(Self::Warm),
            _ => None,
        }
    }
}

/// RGBA color with straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl CssColor {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or a
    /// basic color keyword.
    pub fn parse(input: &str) -> Result<Self, ImagingError> {
        let s = input.trim().to_ascii_lowercase();
        if s.starts_with('#') {
            return Self::parse_hex(&s);
        }
        if let Some(body) = s.strip_prefix("rgba(").and_then(|b| b.strip_suffix(')')) {
            return Self::parse_components(input, body, true);
        }
        if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
            return Self::parse_components(input, body, false);
        }
        match s.as_str() {
            "white" => Ok(Self::opaque(255, 255, 255)),
            "black" => Ok(Self::opaque(0, 0, 0)),
            "red" => Ok(Self::opaque(255, 0, 0)),
            "green" => Ok(Self::opaque(0, 128, 0)),
            "blue" => Ok(Self::opaque(0, 0, 255)),
            "yellow" => Ok(Self::opaque(255, 255, 0)),
            "gray" | "grey" => Ok(Self::opaque(128, 128, 128)),
            _ => Err(invalid_color(input)),
        }
    }

    /// Parse a `#rgb` or `#rrggbb` hex color.
    pub fn parse_hex(input: &str) -> Result<Self, ImagingError> {
        let hex = input
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| invalid_color(input))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid_color(input));
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid_color(input));
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..=i].repeat(2));
                Ok(Self::opaque(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::opaque(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid_color(input)),
        }
    }

    fn parse_components(input: &str, body: &str, with_alpha: bool) -> Result<Self, ImagingError> {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if with_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid_color(input));
        }
        let channel = |s: &str| s.parse::<u8>().map_err(|_| invalid_color(input));
        let a = if with_alpha {
            let a: f32 = parts[3].parse().map_err(|_| invalid_color(input))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(invalid_color(input));
            }
            a
        } else {
            1.0
        };
        Ok(Self {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }
}

fn invalid_color(input: &str) -> ImagingError {
    ImagingError::Validation(format!("unrecognized color {input:?}"))
}

/// Font request for text measurement and drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
    pub family: String,
}

/// Watermark anchor. Each non-center anchor sits 20px in from its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl WatermarkPosition {
    /// Unknown names fall back to bottom-right.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            "center" => Self::Center,
            other => {
                warn!(position = other, "unknown watermark position, using bottom-right");
                Self::BottomRight
            }
        }
    }
}

/// Text overlay styling.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    pub font_size: f32,
    pub color: CssColor,
    pub position: WatermarkPosition,
    pub font_family: String,
}

impl WatermarkOptions {
    pub fn validate(&self) -> Result<(), ImagingError> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ImagingError::Validation(format!(
                "font size {} must be positive",
                self.font_size
            )));
        }
        Ok(())
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            size_px: self.font_size,
            family: self.font_family.clone(),
        }
    }
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            color: CssColor {
                r: 255,
                g: 255,
                b: 255,
                a: 0.5,
            },
            position: WatermarkPosition::BottomRight,
            font_family: "Arial".to_string(),
        }
    }
}
