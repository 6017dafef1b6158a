//! Encoded byte payloads flowing in and out of the pipeline.
//!
//! An [`ImageBlob`] is immutable once built: every operation consumes a
//! reference and produces a fresh blob. [`TargetFormat`] is the closed set of
//! raster encodings the pipeline can write.

use super::backend::ImagingError;
use crate::naming;
use std::path::Path;
use tracing::warn;

/// Raster encodings the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
}

impl TargetFormat {
    /// Exact, case-insensitive lookup. `jpg` and `jpeg` both map to JPEG.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Lookup that falls back to PNG for unrecognized names.
    pub fn parse_lenient(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!(format = name, "unrecognized target format, using png");
            Self::Png
        })
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the quality parameter changes the encoder's output.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::Webp)
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp)
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded raster image plus the media type and file name it travels with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Vec<u8>,
    mime: String,
    name: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            name: name.into(),
        }
    }

    /// Read a file from disk, sniffing the media type from its content and
    /// falling back to its extension.
    pub fn from_path(path: &Path) -> Result<Self, ImagingError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = sniff_mime(&bytes)
            .or_else(|| naming::extension(&name).and_then(mime_for_extension))
            .unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, mime, name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The raster format this blob is labelled with, when it is one we can write.
    pub fn format(&self) -> Option<TargetFormat> {
        TargetFormat::from_mime(&self.mime)
    }
}

/// Page orientation of an exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

/// A single-page document wrapping one raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlob {
    pub bytes: Vec<u8>,
    pub name: String,
    pub page_width: u32,
    pub page_height: u32,
    pub orientation: PageOrientation,
}

impl DocumentBlob {
    pub const MIME: &'static str = "application/pdf";

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a format export: either a raster image or a paginated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exported {
    Image(ImageBlob),
    Document(DocumentBlob),
}

impl Exported {
    pub fn name(&self) -> &str {
        match self {
            Exported::Image(blob) => blob.name(),
            Exported::Document(doc) => &doc.name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Exported::Image(blob) => blob.bytes(),
            Exported::Document(doc) => &doc.bytes,
        }
    }
}

/// Extension → media type table for the formats the pipeline reads and writes.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "pdf" => Some(DocumentBlob::MIME),
        _ => None,
    }
}

/// Media type for a target format name, PNG when the name is unknown.
pub fn mime_for_format(name: &str) -> &'static str {
    TargetFormat::from_name(name)
        .unwrap_or(TargetFormat::Png)
        .mime()
}

/// File extension for a media type, `png` when the type is unknown.
pub fn extension_for_mime(mime: &str) -> &'static str {
    TargetFormat::from_mime(mime)
        .unwrap_or(TargetFormat::Png)
        .extension()
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(match format {
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::WebP => "image/webp",
        image::ImageFormat::Gif => "image/gif",
        image::ImageFormat::Bmp => "image/bmp",
        image::ImageFormat::Tiff => "image/tiff",
        _ => return None,
    })
}
