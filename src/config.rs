//! Editor configuration module.
//!
//! Handles loading, validating, and merging `pixelkit.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys.
//!
//! ## Lookup
//!
//! Passed explicitly with `--config FILE`, otherwise `pixelkit.toml` in the
//! current directory is used when present.
//!
//! ## Keys
//!
//! ```toml
//! # Every key is optional; the values below are the defaults
//!
//! [limits]
//! tolerance_min = 10        # Background tolerance range
//! tolerance_max = 100
//! blur_min = 5.0            # Background blur radius range (px)
//! blur_max = 50.0
//! percent_max = 1000.0      # Largest percentage resize
//! max_file_size_mb = 50     # Input size ceiling
//! max_dimension = 16384     # Largest output width or height (px)
//!
//! [compress]
//! quality = 80              # Lossy quality (1-100)
//! max_edge = 4096           # Longest edge after compression (px)
//!
//! [watermark]
//! font_size = 48
//! color = "rgba(255, 255, 255, 0.5)"
//! position = "bottom-right" # top-left, top-right, bottom-left, bottom-right, center
//! font_family = "Arial"
//! # font_path = "fonts/Inter.ttf"
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys and sections are rejected.

use crate::imaging::{CssColor, Limits, Quality, WatermarkOptions, WatermarkPosition};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pixelkit.toml";

const WATERMARK_POSITIONS: [&str; 5] = [
    "top-left",
    "top-right",
    "bottom-left",
    "bottom-right",
    "center",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `pixelkit.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Accepted parameter ranges and the input size ceiling.
    pub limits: Limits,
    /// Defaults for the `compress` command.
    pub compress: CompressConfig,
    /// Defaults for the `watermark` command.
    pub watermark: WatermarkConfig,
    /// Batch worker pool.
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.tolerance_min > limits.tolerance_max {
            return Err(ConfigError::Validation(
                "limits.tolerance_min must not exceed limits.tolerance_max".into(),
            ));
        }
        if !(limits.blur_min > 0.0 && limits.blur_min <= limits.blur_max) {
            return Err(ConfigError::Validation(
                "limits.blur_min must be positive and not exceed limits.blur_max".into(),
            ));
        }
        if !(limits.percent_max.is_finite() && limits.percent_max > 0.0) {
            return Err(ConfigError::Validation(
                "limits.percent_max must be positive".into(),
            ));
        }
        if limits.max_file_size_mb == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size_mb must be non-zero".into(),
            ));
        }
        if limits.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "limits.max_dimension must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.compress.quality) {
            return Err(ConfigError::Validation(
                "compress.quality must be 1-100".into(),
            ));
        }
        if self.compress.max_edge == 0 {
            return Err(ConfigError::Validation(
                "compress.max_edge must be non-zero".into(),
            ));
        }
        if !(self.watermark.font_size.is_finite() && self.watermark.font_size > 0.0) {
            return Err(ConfigError::Validation(
                "watermark.font_size must be positive".into(),
            ));
        }
        if CssColor::parse(&self.watermark.color).is_err() {
            return Err(ConfigError::Validation(format!(
                "watermark.color '{}' is not a color",
                self.watermark.color
            )));
        }
        if !WATERMARK_POSITIONS.contains(&self.watermark.position.as_str()) {
            return Err(ConfigError::Validation(format!(
                "watermark.position must be one of {}",
                WATERMARK_POSITIONS.join(", ")
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Compression defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Lossy quality, 1-100.
    pub quality: u32,
    /// The longest edge is scaled down to this before re-encoding.
    pub max_edge: u32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            max_edge: 4096,
        }
    }
}

impl CompressConfig {
    pub fn quality(&self) -> Result<Quality, ConfigError> {
        Quality::from_percent(self.quality).map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

/// Watermark text styling defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    pub font_size: f32,
    /// Any CSS color the pipeline understands (`#rrggbb`, `rgba(...)`, ...).
    pub color: String,
    pub position: String,
    /// Requested family. Only recorded, the drawing face is the bundled one
    /// unless `font_path` is set.
    pub font_family: String,
    /// TrueType/OpenType file that replaces the bundled face.
    pub font_path: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            color: "rgba(255, 255, 255, 0.5)".into(),
            position: "bottom-right".into(),
            font_family: "Arial".into(),
            font_path: None,
        }
    }
}

impl WatermarkConfig {
    pub fn to_options(&self) -> Result<WatermarkOptions, ConfigError> {
        let color =
            CssColor::parse(&self.color).map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(WatermarkOptions {
            font_size: self.font_size,
            color,
            position: WatermarkPosition::parse_lenient(&self.position),
            font_family: self.font_family.clone(),
        })
    }
}

/// Worker pool sizing for batch runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on batch workers. `None` means one per core; larger
    /// values are capped at the core count.
    pub max_processes: Option<usize>,
}

/// Number of rayon workers for a batch run: all cores unless
/// `max_processes` asks for fewer.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match config.max_processes {
        Some(requested) => requested.min(cores),
        None => cores,
    }
}

// =============================================================================
// Loading
// =============================================================================

/// [`EditorConfig::default`] as a TOML table, the base every user file is
/// layered onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EditorConfig::default()).expect("default config must serialize")
}

/// Layer `overlay` onto `base`. Tables merge per key and recurse; any other
/// overlay value wins outright. Base keys absent from the overlay survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                let combined = match merged.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                merged.insert(key, combined);
            }
            toml::Value::Table(merged)
        }
        (_, replacement) => replacement,
    }
}

/// Parse a config file without deserializing it; a missing file is `None`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&text)?))
}

/// Apply the user layer (if any) to `base` and turn the result into a
/// validated [`EditorConfig`].
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let layered = match overlay {
        Some(user) => merge_toml(base, user),
        None => base,
    };
    let config: EditorConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the editor config.
///
/// An explicit path must exist. Without one, `pixelkit.toml` in the working
/// directory is used if present, otherwise the stock defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EditorConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => match load_raw_config(path)? {
            Some(value) => Some(value),
            None => {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file {} not found", path.display()),
                )));
            }
        },
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `pixelkit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pixelkit Configuration
# ======================
# Every key is optional and shows its default value; delete whatever you
# do not want to change.
#
# Pass a file with `pixelkit --config FILE`, or save this as pixelkit.toml
# in the directory you run pixelkit from.
# Misspelled or unknown keys are rejected.

# ---------------------------------------------------------------------------
# Parameter limits
# ---------------------------------------------------------------------------
[limits]
# Background tolerance range (sum of RGB channel differences).
tolerance_min = 10
tolerance_max = 100

# Background blur radius range, in pixels.
blur_min = 5.0
blur_max = 50.0

# Largest accepted percentage for `resize --percent`.
percent_max = 1000.0

# Inputs larger than this many megabytes are refused.
max_file_size_mb = 50

# Resize, rotate and percentage results wider or taller than this many
# pixels are refused before any pixels are allocated.
max_dimension = 16384

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compress]
# Lossy quality (1 = worst, 100 = best) for JPEG and WebP output.
quality = 80

# Images are scaled down so their longest edge is at most this many pixels.
max_edge = 4096

# ---------------------------------------------------------------------------
# Watermark text
# ---------------------------------------------------------------------------
[watermark]
font_size = 48.0

# Any CSS color: "#rrggbb", "#rgb", "rgb(r, g, b)", "rgba(r, g, b, a)".
color = "rgba(255, 255, 255, 0.5)"

# One of: top-left, top-right, bottom-left, bottom-right, center
position = "bottom-right"

# Requested font family. Text is drawn with the bundled DejaVu Sans face
# unless font_path points at a TrueType/OpenType file.
font_family = "Arial"
# font_path = "fonts/Inter-Regular.ttf"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Batch worker cap. Left out, batch runs use one worker per CPU core;
# larger numbers are capped at the core count.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_limits() {
        let config = EditorConfig::default();
        assert_eq!(config.limits.tolerance_min, 10);
        assert_eq!(config.limits.tolerance_max, 100);
        assert_eq!(config.limits.max_file_size_mb, 50);
        assert_eq!(config.limits.max_dimension, 16384);
    }

    #[test]
    fn edge_limit_overridable() {
        let config = resolve_config(
            stock_defaults_value(),
            Some(toml::from_str("[limits]\nmax_dimension = 2000").unwrap()),
        )
        .unwrap();
        assert_eq!(config.limits.max_dimension, 2000);
        assert_eq!(config.limits.percent_max, 1000.0);
    }

    #[test]
    fn default_config_has_compress_settings() {
        let config = EditorConfig::default();
        assert_eq!(config.compress.quality, 80);
        assert_eq!(config.compress.max_edge, 4096);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[compress]
quality = 65
"#;
        let config: EditorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.compress.quality, 65);
        assert_eq!(config.compress.max_edge, 4096);
        assert_eq!(config.watermark.position, "bottom-right");
    }

    #[test]
    fn integer_font_size_accepted() {
        let config: EditorConfig = toml::from_str("[watermark]\nfont_size = 32").unwrap();
        assert_eq!(config.watermark.font_size, 32.0);
    }

    // =========================================================================
    // Watermark conversion
    // =========================================================================

    #[test]
    fn watermark_defaults_convert_to_options() {
        let options = WatermarkConfig::default().to_options().unwrap();
        assert_eq!(options, WatermarkOptions::default());
    }

    #[test]
    fn watermark_custom_values_convert() {
        let config: EditorConfig = toml::from_str(
            r##"
[watermark]
color = "#ff0000"
position = "top-left"
"##,
        )
        .unwrap();
        let options = config.watermark.to_options().unwrap();
        assert_eq!(options.color, CssColor::opaque(255, 0, 0));
        assert_eq!(options.position, WatermarkPosition::TopLeft);
    }

    #[test]
    fn compress_quality_converts() {
        let quality = CompressConfig::default().quality().unwrap();
        assert_eq!(quality.percent(), 80);
    }

    // =========================================================================
    // Config file loading
    // =========================================================================

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[limits]
max_file_size_mb = 10

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.limits.max_file_size_mb, 10);
        assert_eq!(config.limits.tolerance_max, 100);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_rejects_broken_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pixelkit.toml");
        fs::write(&path, "[compress\nquality = ").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    // =========================================================================
    // Worker count
    // =========================================================================

    fn cores() -> usize {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }

    #[test]
    fn worker_count_defaults_to_all_cores() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores());
    }

    #[test]
    fn worker_count_never_exceeds_cores() {
        let capped = ProcessingConfig {
            max_processes: Some(usize::MAX),
        };
        assert_eq!(effective_threads(&capped), cores());

        let single = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&single), 1);
    }

    // =========================================================================
    // Layering
    // =========================================================================

    #[test]
    fn merge_keeps_untouched_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[compress]
quality = 80
max_edge = 4096
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[compress]\nquality = 60").unwrap();
        let merged = merge_toml(base, overlay);
        let compress = merged.get("compress").unwrap();
        assert_eq!(compress.get("quality").unwrap().as_integer(), Some(60));
        assert_eq!(compress.get("max_edge").unwrap().as_integer(), Some(4096));
    }

    #[test]
    fn merge_scalar_overrides_table() {
        let base: toml::Value = toml::from_str("[a]\nb = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(5));
    }

    // =========================================================================
    // Typos
    // =========================================================================

    #[test]
    fn misspelled_key_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[compress]\nqualty = 90");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn misspelled_section_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[compression]\nquality = 90");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_limits_key_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[limits]\ntolerance = 5");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn resolve_str(overlay: &str) -> Result<EditorConfig, ConfigError> {
        resolve_config(stock_defaults_value(), Some(toml::from_str(overlay).unwrap()))
    }

    #[test]
    fn defaults_are_valid() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_inverted_tolerance_range() {
        let result = resolve_str("[limits]\ntolerance_min = 200");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_inverted_blur_range() {
        let result = resolve_str("[limits]\nblur_min = 60.0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_sizes() {
        for overlay in [
            "[limits]\nmax_file_size_mb = 0",
            "[limits]\nmax_dimension = 0",
            "[compress]\nmax_edge = 0",
            "[compress]\nquality = 0",
            "[processing]\nmax_processes = 0",
        ] {
            assert!(
                matches!(resolve_str(overlay), Err(ConfigError::Validation(_))),
                "{overlay}"
            );
        }
    }

    #[test]
    fn quality_bounds_inclusive() {
        assert!(resolve_str("[compress]\nquality = 100").is_ok());
        assert!(resolve_str("[compress]\nquality = 1").is_ok());
        assert!(resolve_str("[compress]\nquality = 101").is_err());
    }

    #[test]
    fn validate_unparsable_color() {
        let result = resolve_str("[watermark]\ncolor = \"not-a-color\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("watermark.color"));
    }

    #[test]
    fn validate_unknown_position() {
        let result = resolve_str("[watermark]\nposition = \"middle\"");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // gen-config output
    // =========================================================================

    #[test]
    fn stock_file_parses() {
        let _: toml::Value = toml::from_str(stock_config_toml()).unwrap();
    }

    #[test]
    fn stock_file_matches_defaults() {
        let config: EditorConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn stock_file_lists_every_section() {
        let text = stock_config_toml();
        for section in ["[limits]", "[compress]", "[watermark]", "[processing]"] {
            assert!(text.contains(section), "{section}");
        }
    }
}
