//! Output file naming.
//!
//! Three conventions, matching what users of the web tool expect:
//! - format converters name their output `converted.<ext>`
//! - format-changing edits swap the extension: `photo.jpg` → `photo.png`
//! - every other edit keeps the input name unchanged
//!
//! The CLI writes next to the input; when that would overwrite the input it
//! uses [`suffixed_name`] instead.
//!
//! Batch runs may produce the same name twice (two `IMG_0001.jpg` from
//! different folders); [`dedupe_name`] suffixes later ones with `-2`, `-3`, ...

use std::collections::HashSet;

/// Extension after the last dot, if any. A leading dot alone (`.hidden`)
/// is not an extension.
pub fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains('/') {
        None
    } else {
        Some(ext)
    }
}

/// Name without its extension.
pub fn stem(name: &str) -> &str {
    match extension(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}

/// Replace (or append) the extension.
///
/// - `"photo.jpg"`, `"png"` → `"photo.png"`
/// - `"archive.tar.gz"`, `"webp"` → `"archive.tar.webp"`
/// - `"README"`, `"png"` → `"README.png"`
pub fn replace_extension(name: &str, ext: &str) -> String {
    format!("{}.{}", stem(name), ext)
}

/// Name given to converter output.
pub fn converted_name(ext: &str) -> String {
    format!("converted.{ext}")
}

/// Insert `-suffix` before the extension: `photo.jpg` → `photo-rotate.jpg`.
pub fn suffixed_name(name: &str, suffix: &str) -> String {
    match extension(name) {
        Some(ext) => format!("{}-{suffix}.{ext}", stem(name)),
        None => format!("{name}-{suffix}"),
    }
}

/// Return `name`, or `stem-N.ext` for the smallest N ≥ 2 not yet taken.
/// The returned name is recorded in `taken`.
pub fn dedupe_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = (stem(name), extension(name));
    (2..)
        .map(|n| match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        })
        .find(|candidate| taken.insert(candidate.clone()))
        .unwrap_or_else(|| name.to_string())
}
