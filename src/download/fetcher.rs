//! Realization of one document: fetch, extract, decode, write.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::retry::{RetryPolicy, with_retry};
use super::{FetchError, HttpClient};
use crate::catalog::Extractor;
use crate::output::{DocumentWritten, OutputSink};
use crate::pdf::PageImage;

/// One document to materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Resolved print-view URL.
    pub source_url: String,
    /// Output name without extension.
    pub output_name: String,
    /// Leaf page URL, sent as `Referer`.
    pub referer: String,
    /// Crawl-order position; orders pages in the shared append document.
    pub sequence: u64,
}

/// Turns [`DownloadTask`]s into written PDF pages.
///
/// Cheap to clone; every spawned task gets its own copy.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: HttpClient,
    extractor: Arc<dyn Extractor>,
    retry: RetryPolicy,
    sink: OutputSink,
}

impl DocumentFetcher {
    /// Creates a fetcher writing into `sink`.
    #[must_use]
    pub fn new(
        client: HttpClient,
        extractor: Arc<dyn Extractor>,
        retry: RetryPolicy,
        sink: OutputSink,
    ) -> Self {
        Self {
            client,
            extractor,
            retry,
            sink,
        }
    }

    /// The sink this fetcher writes into.
    #[must_use]
    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Fetches the rendering page, decodes its image and writes it.
    ///
    /// On any failure before the write, the task's append slot is released
    /// so later pages are not held back.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Unreachable`] when the page cannot be fetched after retries
    /// - [`FetchError::MissingImage`] when the page has no image
    /// - [`FetchError::MalformedPayload`] when the payload cannot be decoded
    /// - [`FetchError::WriteFailed`] when the output cannot be written
    #[instrument(skip(self, task), fields(url = %task.source_url, name = %task.output_name))]
    pub async fn run(&self, task: &DownloadTask) -> Result<DocumentWritten, FetchError> {
        let image = match self.page_image(task).await {
            Ok(image) => image,
            Err(e) => {
                self.sink.release(task.sequence).await;
                return Err(e);
            }
        };
        self.sink.write(task.sequence, &task.output_name, image).await
    }

    async fn page_image(&self, task: &DownloadTask) -> Result<PageImage, FetchError> {
        let url = task.source_url.as_str();
        let referer = task.referer.as_str();
        let page = with_retry(&self.retry, url, || {
            self.client.fetch_page(url, Some(referer))
        })
        .await
        .map_err(|(e, attempts)| {
            warn!(attempts, error = %e, "rendering page unreachable");
            e
        })?;

        let payload = self
            .extractor
            .embedded_image(&page)
            .map_err(|e| FetchError::from_extraction(url, e))?;
        debug!(bytes = payload.len(), "payload extracted");

        tokio::task::spawn_blocking(move || PageImage::decode(&payload))
            .await
            .map_err(|e| FetchError::malformed(url, format!("decoder task failed: {e}")))?
            .map_err(|e| FetchError::malformed(url, e))
    }
}
