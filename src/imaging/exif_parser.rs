//! EXIF tag extraction and the human-readable display mapping.
//!
//! Reads the primary IFD (camera, exposure, lens, dimensions, orientation)
//! and the GPS IFD from JPEG, TIFF, PNG and WebP containers via
//! `kamadak-exif`. Thumbnail IFDs are skipped. A missing tag block is
//! reported as [`MetadataReport::NoMetadata`], never as an empty record.

use super::backend::ImagingError;
use exif::{Exif, In, Tag, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::debug;

/// Key under which decoded GPS coordinates are stored.
pub const GPS_POSITION: &str = "GPSPosition";

/// A single tag value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Number(f64),
    Coordinates { latitude: f64, longitude: f64 },
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Text(s) => f.write_str(s),
            TagValue::Number(n) => write!(f, "{n}"),
            TagValue::Coordinates {
                latitude,
                longitude,
            } => write!(f, "{latitude:.6}, {longitude:.6}"),
        }
    }
}

/// Tag name → value, ordered by name.
pub type MetadataRecord = BTreeMap<String, TagValue>;

/// Outcome of inspecting a blob's embedded tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "tags", rename_all = "snake_case")]
pub enum MetadataReport {
    Tags(MetadataRecord),
    NoMetadata,
}

/// Parse embedded EXIF from encoded image bytes.
///
/// Bytes that are not a raster image at all are a decode error. Containers
/// that cannot carry EXIF (GIF, BMP) and files without a tag block yield
/// `NoMetadata`. A tag block that exists but is corrupt is a metadata error.
pub fn read_exif(bytes: &[u8]) -> Result<MetadataReport, ImagingError> {
    let format = image::guess_format(bytes)
        .map_err(|e| ImagingError::Decode(format!("unrecognized image data: {e}")))?;
    if matches!(format, image::ImageFormat::Gif | image::ImageFormat::Bmp) {
        return Ok(MetadataReport::NoMetadata);
    }

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(MetadataReport::NoMetadata),
        Err(e) => return Err(ImagingError::Metadata(e.to_string())),
    };

    let record = collect_record(&exif);
    debug!(tags = record.len(), "parsed exif block");
    if record.is_empty() {
        Ok(MetadataReport::NoMetadata)
    } else {
        Ok(MetadataReport::Tags(record))
    }
}

fn collect_record(exif: &Exif) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = match &field.value {
            Value::Ascii(parts) => TagValue::Text(
                parts
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Value::Rational(v) if v.len() == 1 && v[0].denom != 0 => TagValue::Number(v[0].to_f64()),
            Value::SRational(v) if v.len() == 1 && v[0].denom != 0 => {
                TagValue::Number(v[0].to_f64())
            }
            Value::Byte(v) if v.len() == 1 => TagValue::Number(v[0] as f64),
            Value::Short(v) if v.len() == 1 => TagValue::Number(v[0] as f64),
            Value::Long(v) if v.len() == 1 => TagValue::Number(v[0] as f64),
            _ => TagValue::Text(field.display_value().to_string()),
        };
        record.insert(field.tag.to_string(), value);
    }

    let latitude = gps_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S');
    let longitude = gps_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W');
    if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
        record.insert(
            GPS_POSITION.to_string(),
            TagValue::Coordinates {
                latitude,
                longitude,
            },
        );
    }
    record
}

/// Degrees/minutes/seconds → signed decimal degrees.
fn gps_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };
    if parts.len() != 3 || parts.iter().any(|r| r.denom == 0) {
        return None;
    }
    let decimal = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    let negative = match exif.get_field(ref_tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(refs)) => refs
            .first()
            .and_then(|r| r.first())
            .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref)),
        _ => false,
    };
    Some(if negative { -decimal } else { decimal })
}

fn orientation_label(value: &TagValue) -> String {
    let TagValue::Number(n) = value else {
        return value.to_string();
    };
    match *n as u32 {
        1 => "Horizontal (normal)".into(),
        2 => "Mirror horizontal".into(),
        3 => "Rotate 180".into(),
        4 => "Mirror vertical".into(),
        5 => "Mirror horizontal and rotate 270 CW".into(),
        6 => "Rotate 90 CW".into(),
        7 => "Mirror horizontal and rotate 90 CW".into(),
        8 => "Rotate 270 CW".into(),
        _ => value.to_string(),
    }
}

/// Display rows for the fields people care about, in a fixed order.
///
/// Each row takes the first of its tags present in the record; rows with
/// none of them are omitted.
pub fn format_metadata(record: &MetadataRecord) -> Vec<(String, String)> {
    type Render = fn(&TagValue) -> String;
    let rows: [(&[&str], &str, Render); 12] = [
        (&["Make"], "Camera Make", |v| v.to_string()),
        (&["Model"], "Camera Model", |v| v.to_string()),
        (&["DateTimeOriginal", "DateTime"], "Date Taken", |v| v.to_string()),
        (&["ExposureTime"], "Exposure Time", |v| format!("{v}s")),
        (&["FNumber"], "F-Number", |v| format!("f/{v}")),
        (&["PhotographicSensitivity"], "ISO", |v| v.to_string()),
        (&["FocalLength"], "Focal Length", |v| format!("{v}mm")),
        (&["LensModel"], "Lens", |v| v.to_string()),
        (&[GPS_POSITION], "GPS", |v| v.to_string()),
        (&["PixelXDimension", "ImageWidth"], "Width", |v| format!("{v}px")),
        (&["PixelYDimension", "ImageLength"], "Height", |v| format!("{v}px")),
        (&["Orientation"], "Orientation", orientation_label),
    ];
    rows.iter()
        .filter_map(|(keys, label, render)| {
            keys.iter()
                .find_map(|key| record.get(*key))
                .map(|value| (label.to_string(), render(value)))
        })
        .collect()
}
