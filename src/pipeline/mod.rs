//! Run configuration, orchestration and reporting.
//!
//! A [`Pipeline`] crawls the catalog leaf by leaf. For each leaf it names the
//! documents, dispatches one task per document under a concurrency limit and
//! waits for all of them before moving on. Per-document and per-branch
//! failures end up in the [`RunSummary`]; only an unreachable index (or an
//! unusable output root) aborts the run.

mod config;
mod error;
mod orchestrator;
mod progress;
mod summary;

pub use config::{
    DEFAULT_CONCURRENCY, NamedSection, OutputMode, PipelineConfig, Preset, SectionSelection,
};
pub use error::{ConfigError, PipelineError};
pub use orchestrator::Pipeline;
pub use progress::{RunProgress, RunState};
pub use summary::{FailedBranch, FailedDocument, RunSummary};
