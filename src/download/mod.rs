//! Page retrieval and per-document materialization.
//!
//! This module provides the shared [`HttpClient`], the [`FetchError`]
//! taxonomy recorded per document, the retry policy applied to every page
//! fetch, and the [`DocumentFetcher`] that turns a print-view page into a
//! written PDF page.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chartfetch_core::catalog::HtmlExtractor;
//! use chartfetch_core::download::{DocumentFetcher, DownloadTask, HttpClient, RetryPolicy};
//! use chartfetch_core::output::OutputSink;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = DocumentFetcher::new(
//!     HttpClient::new(),
//!     Arc::new(HtmlExtractor::new("AD")?),
//!     RetryPolicy::default(),
//!     OutputSink::Directory("./output/byop".into()),
//! );
//! let task = DownloadTask {
//!     source_url: "https://aip.example/print/AD/abc.html".to_string(),
//!     output_name: "VFR_VFR-AIP_Chart".to_string(),
//!     referer: "https://aip.example/chapter/leaf.html".to_string(),
//!     sequence: 0,
//! };
//! let written = fetcher.run(&task).await?;
//! println!("wrote {}", written.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod fetcher;
mod retry;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::{FailureKind, FetchError};
pub use fetcher::{DocumentFetcher, DownloadTask};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error, with_retry,
};
