//! # Pixelkit
//!
//! A stateless image-transform toolkit. Every operation takes one encoded
//! image plus parameters and returns a new encoded image: format conversion,
//! PDF export, resizing, compression, rotation, flips, crops, color
//! adjustments, filter presets, text watermarks, background removal and
//! EXIF inspection.
//!
//! # Architecture: Blob In, Blob Out
//!
//! ```text
//! ImageBlob ──decode──▶ PixelBuffer ──transform──▶ PixelBuffer ──encode──▶ ImageBlob
//! ```
//!
//! Operations never share state. Chaining edits is ordinary function
//! composition: the output blob of one call is the input of the next. Nothing
//! is cached and nothing touches the filesystem below the [`input`] boundary.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The pipeline: codecs, pixel engines, parameter types, one function per operation |
//! | [`batch`] | One operation applied to many files on the rayon pool, with a JSON manifest |
//! | [`input`] | Filesystem boundary: directory walking and the input size ceiling |
//! | [`config`] | `pixelkit.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Serializable before/after summaries shared by the CLI and batch runs |
//! | [`naming`] | Output file naming conventions |
//! | [`output`] | CLI output formatting (pure `format_*` plus `print_*` wrappers) |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate, off-axis rotation uses
//! `imageproc`, text is rasterized with `fontdue`, EXIF is read with
//! `kamadak-exif` and PDFs are assembled with `lopdf`. There are no system
//! libraries to install; the binary is self-contained, bundled font included.
//!
//! ## Canvas Semantics
//!
//! Results match what a browser canvas would produce for the same edit:
//! JPEG has no alpha so transparent pixels are composited over black, EXIF
//! orientation is applied on decode, and the quality factor only affects
//! lossy output.
//!
//! ## Backend Trait
//!
//! Codec, scaling, blur and text work goes through [`imaging::ImageBackend`].
//! Pure pixel math (color matrices, chroma keying, flips, crops and rotation
//! geometry) lives outside the trait so it can be tested directly, and the
//! operation layer is tested against a recording mock backend without any
//! pixel work.
//!
//! ## Validation Before Decoding
//!
//! Parameters are validated into small newtypes ([`imaging::Quality`],
//! [`imaging::Tolerance`], [`imaging::Percent`], ...) before an image is
//! decoded, so a bad argument fails fast and never costs a decode.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod input;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
