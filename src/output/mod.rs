//! Output destinations for converted documents.
//!
//! Per-document mode writes one single-page PDF per document into a
//! directory. Append mode routes every page through one [`AppendWriter`].
//! Packaging of the finished root is delegated to an [`OutputAssembler`].

mod append;
mod assembler;

pub use append::{AppendHandle, AppendOutcome, AppendWriter};
pub use assembler::{AssembleError, AssemblerChain, ManifestCopy, OutputAssembler, ZipArchive};

use std::path::PathBuf;

use tracing::debug;

use crate::download::FetchError;
use crate::pdf::{self, PageImage};

/// Extension of every written document.
pub const PDF_EXTENSION: &str = "pdf";

/// A page that reached disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentWritten {
    /// File the page was written to.
    pub path: PathBuf,
    /// Bytes written for this document.
    pub bytes: u64,
}

/// Where converted pages go.
#[derive(Debug, Clone)]
pub enum OutputSink {
    /// One `<name>.pdf` per document in this directory.
    Directory(PathBuf),
    /// Every page appended to one shared document.
    Append(AppendHandle),
}

impl OutputSink {
    /// True for the shared append document.
    #[must_use]
    pub fn is_append(&self) -> bool {
        matches!(self, Self::Append(_))
    }

    /// Writes `page` for the document named `name` holding append slot `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::WriteFailed`] with the target path.
    pub async fn write(
        &self,
        sequence: u64,
        name: &str,
        page: PageImage,
    ) -> Result<DocumentWritten, FetchError> {
        match self {
            Self::Directory(dir) => {
                let path = dir.join(format!("{name}.{PDF_EXTENSION}"));
                let bytes = pdf::single_page_document(&page);
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| FetchError::write_failed(&path, e))?;
                debug!(path = %path.display(), bytes = bytes.len(), "document written");
                Ok(DocumentWritten {
                    path,
                    bytes: bytes.len() as u64,
                })
            }
            Self::Append(handle) => {
                let bytes = handle
                    .append(sequence, page)
                    .await
                    .map_err(|e| FetchError::write_failed(handle.path(), e))?;
                Ok(DocumentWritten {
                    path: handle.path().to_path_buf(),
                    bytes,
                })
            }
        }
    }

    /// Releases append slot `sequence` for a document that produced no page.
    pub async fn release(&self, sequence: u64) {
        if let Self::Append(handle) = self {
            handle.skip(sequence).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page() -> PageImage {
        PageImage {
            width: 3,
            height: 2,
            data: vec![0x78, 0x9c, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01],
        }
    }

    #[tokio::test]
    async fn test_directory_sink_writes_named_pdf() {
        let dir = TempDir::new().unwrap();
        let sink = OutputSink::Directory(dir.path().to_path_buf());
        let written = sink.write(0, "VFR_VFR-AIP_Chart", page()).await.unwrap();

        assert_eq!(written.path, dir.path().join("VFR_VFR-AIP_Chart.pdf"));
        let bytes = std::fs::read(&written.path).unwrap();
        assert_eq!(bytes.len() as u64, written.bytes);
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(!sink.is_append());
    }

    #[tokio::test]
    async fn test_directory_sink_missing_dir_is_write_failed() {
        let dir = TempDir::new().unwrap();
        let sink = OutputSink::Directory(dir.path().join("absent"));
        let err = sink.write(0, "x", page()).await.unwrap_err();
        assert!(matches!(err, FetchError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn test_append_sink_reports_shared_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VFR_AIP.pdf");
        let (writer, handle) = AppendWriter::create(&path).await.unwrap();
        let sink = OutputSink::Append(handle);

        sink.release(0).await;
        let written = sink.write(1, "ignored", page()).await.unwrap();
        assert_eq!(written.path, path);
        drop(sink);

        assert_eq!(writer.finish().await.unwrap().pages, 1);
    }
}
