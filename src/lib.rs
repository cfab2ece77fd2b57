//! Chartfetch Core Library
//!
//! This library crawls a published VFR chart catalog (index → sections →
//! leaf-groups → documents), pulls the inline chart image out of every
//! document's print view, and materializes it as a page-image PDF.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Catalog data model, link resolution, HTML extraction and the crawler
//! - [`naming`] - Output naming policy for chart documents
//! - [`download`] - Shared HTTP client, retry policy and the per-document fetcher
//! - [`pdf`] - Payload decoding and the incremental page-image PDF writer
//! - [`output`] - Output sinks (per-document files, serialized append writer) and assemblers
//! - [`pipeline`] - Run configuration, presets and the orchestrator

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod naming;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use catalog::{
    BranchError, CatalogCrawler, DocumentEntry, ExtractionError, Extractor, HtmlExtractor,
    LeafBatch, LeafContext, LinkError, LinkRef, print_url, resolve_href,
};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DocumentFetcher, DownloadTask, FailureKind, FailureType, FetchError,
    HttpClient, RetryDecision, RetryPolicy, classify_error,
};
pub use naming::{InfoDocPolicy, NamingPolicy, sanitize_filename};
pub use output::{
    AppendHandle, AppendWriter, AssembleError, AssemblerChain, ManifestCopy, OutputAssembler,
    OutputSink, ZipArchive,
};
pub use pdf::{PageImage, PdfError};
pub use pipeline::{
    ConfigError, DEFAULT_CONCURRENCY, FailedBranch, FailedDocument, NamedSection, OutputMode,
    Pipeline, PipelineConfig, PipelineError, Preset, RunProgress, RunState, RunSummary,
    SectionSelection,
};
