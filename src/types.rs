//! Shared types used by the CLI, the batch runner and the printers.
//!
//! These are serialized into `manifest.json` by batch runs and must stay
//! stable across releases.

use crate::imaging::{DocumentBlob, Exported, ImageBlob};
use serde::{Deserialize, Serialize};

/// Name, byte size and MIME type of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

pub fn file_info(blob: &ImageBlob) -> FileInfo {
    FileInfo {
        name: blob.name().to_string(),
        size: blob.size(),
        mime: blob.mime().to_string(),
    }
}

/// Before/after summary of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSummary {
    /// Operation label shown to the user (`"rotate"`, `"compress"`, ...)
    pub operation: String,
    pub input: FileInfo,
    pub output: FileInfo,
    /// Pixel size of the output, when it is an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

impl OutputSummary {
    pub fn new(operation: &str, input: &ImageBlob, output: &Exported) -> Self {
        let output_info = match output {
            Exported::Image(blob) => file_info(blob),
            Exported::Document(doc) => FileInfo {
                name: doc.name.clone(),
                size: doc.size(),
                mime: DocumentBlob::MIME.to_string(),
            },
        };
        Self {
            operation: operation.to_string(),
            input: file_info(input),
            output: output_info,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: (u32, u32)) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::PageOrientation;

    #[test]
    fn file_info_copies_blob_fields() {
        let blob = ImageBlob::new(vec![0; 12], "image/png", "a.png");
        assert_eq!(
            file_info(&blob),
            FileInfo {
                name: "a.png".into(),
                size: 12,
                mime: "image/png".into(),
            }
        );
    }

    #[test]
    fn summary_for_document_uses_pdf_mime() {
        let input = ImageBlob::new(vec![0; 40], "image/jpeg", "scan.jpg");
        let doc = DocumentBlob {
            bytes: vec![0; 90],
            name: "scan.pdf".into(),
            page_width: 10,
            page_height: 20,
            orientation: PageOrientation::Portrait,
        };
        let summary = OutputSummary::new("pdf", &input, &Exported::Document(doc));
        assert_eq!(summary.output.mime, "application/pdf");
        assert_eq!(summary.output.size, 90);
        assert_eq!(summary.input.name, "scan.jpg");
    }

    #[test]
    fn summary_dimensions_skipped_when_absent() {
        let input = ImageBlob::new(vec![1], "image/png", "a.png");
        let summary = OutputSummary::new("flip", &input, &Exported::Image(input.clone()));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("dimensions"));
        let json = serde_json::to_string(&summary.with_dimensions((3, 4))).unwrap();
        assert!(json.contains("\"dimensions\":[3,4]"));
    }
}
