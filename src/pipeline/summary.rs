//! Serializable outcome of a run.

use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::BranchError;
use crate::download::{FailureKind, FetchError};

/// A document that was dispatched (or refused) and not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDocument {
    /// Print-view URL, or the raw href when it could not be resolved.
    pub url: String,
    /// Output name the document would have received.
    pub output_name: String,
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable error.
    pub message: String,
}

impl FailedDocument {
    /// Records `error` against the document at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>, output_name: impl Into<String>, error: &FetchError) -> Self {
        Self {
            url: url.into(),
            output_name: output_name.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A section or leaf that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBranch {
    /// `section` or `leaf`.
    pub level: &'static str,
    /// Branch URL.
    pub url: String,
    /// Why it was skipped.
    pub reason: String,
}

impl From<&BranchError> for FailedBranch {
    fn from(error: &BranchError) -> Self {
        let (level, reason) = match error {
            BranchError::SectionUnreachable { reason, .. } => ("section", reason),
            BranchError::LeafUnreachable { reason, .. } => ("leaf", reason),
        };
        Self {
            level,
            url: error.url().to_string(),
            reason: reason.clone(),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Documents written to disk.
    pub documents_written: usize,
    /// Documents for which the naming policy created no task.
    pub documents_skipped: usize,
    /// Bytes written across all documents.
    pub bytes_written: u64,
    /// Skipped sections and leaves.
    pub branch_errors: Vec<FailedBranch>,
    /// Documents that failed.
    pub errors: Vec<FailedDocument>,
    /// True when the run stopped early on request.
    pub interrupted: bool,
    /// Files produced, sorted.
    pub output_files: Vec<PathBuf>,
    /// Failures while closing the output or running assemblers.
    pub finalize_errors: Vec<String>,
}

impl RunSummary {
    /// Number of failed documents.
    #[must_use]
    pub fn documents_failed(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing failed and the run was not interrupted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
            && self.branch_errors.is_empty()
            && self.finalize_errors.is_empty()
            && !self.interrupted
    }

    /// URLs worth re-running: failed documents, then skipped branches.
    pub fn failed_urls(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .map(|e| e.url.as_str())
            .chain(self.branch_errors.iter().map(|b| b.url.as_str()))
    }

    pub(crate) fn record_failure(&mut self, url: &str, output_name: &str, error: &FetchError) {
        self.errors.push(FailedDocument::new(url, output_name, error));
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
