//! Reading images from disk.
//!
//! The pipeline itself never touches the filesystem. This module is the
//! boundary: it expands directories into image files and enforces the
//! configured input size ceiling before any bytes reach a decoder.

use crate::imaging::{ImageBlob, ImagingError, Limits, supported_input_extensions};
use crate::naming;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path} is {size_mb:.1} MB, the limit is {limit_mb} MB")]
    TooLarge {
        path: PathBuf,
        size_mb: f64,
        limit_mb: u64,
    },
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

/// Whether the file extension is one the decoder accepts.
pub fn is_supported_image(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(naming::extension)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            supported_input_extensions().contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Expand files and directories into a list of image files.
///
/// Files named explicitly are kept as given. Directories are walked
/// recursively and contribute only supported images, sorted by path.
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>, InputError> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_supported_image(p))
                .collect();
            found.sort();
            images.extend(found);
        } else if path.exists() {
            images.push(path.clone());
        } else {
            return Err(InputError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
    }
    Ok(images)
}

/// Refuse inputs above `limits.max_file_size_mb`.
pub fn check_size(path: &Path, size: u64, limits: &Limits) -> Result<(), InputError> {
    let limit_bytes = limits.max_file_size_mb.saturating_mul(1024 * 1024);
    if size > limit_bytes {
        return Err(InputError::TooLarge {
            path: path.to_path_buf(),
            size_mb: size as f64 / (1024.0 * 1024.0),
            limit_mb: limits.max_file_size_mb,
        });
    }
    Ok(())
}

/// Load an image file after checking it against the size ceiling.
pub fn read_image(path: &Path, limits: &Limits) -> Result<ImageBlob, InputError> {
    let size = fs::metadata(path)?.len();
    check_size(path, size, limits)?;
    Ok(ImageBlob::from_path(path)?)
}
