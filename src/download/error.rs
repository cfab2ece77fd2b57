//! Error types for page and document retrieval.
//!
//! Every per-document failure is a [`FetchError`]; the orchestrator records
//! it against the task and moves on, so these errors never abort a run.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::ExtractionError;

/// Errors that can occur while realizing one page fetch or download task.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("unreachable {url}: {detail}")]
    Unreachable {
        /// The URL that failed.
        url: String,
        /// HTTP status when the server answered with a non-success code.
        status: Option<u16>,
        /// Human-readable cause.
        detail: String,
    },

    /// The rendering page has no embedded image.
    #[error("no embedded image on {url}")]
    MissingImage {
        /// Rendering page URL.
        url: String,
    },

    /// The embedded payload could not be decoded into an image.
    #[error("malformed image payload on {url}: {reason}")]
    MalformedPayload {
        /// Rendering page URL.
        url: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// The output document could not be written.
    #[error("failed writing {path}: {source}")]
    WriteFailed {
        /// Output path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Another document in this run already derived the same output name.
    #[error("output name {name:?} already used in this run; not fetching {url}")]
    NameCollision {
        /// Document URL that was not fetched.
        url: String,
        /// The colliding output name.
        name: String,
    },
}

/// Serializable classification of a [`FetchError`] for run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`FetchError::Unreachable`].
    Unreachable,
    /// See [`FetchError::MissingImage`].
    MissingImage,
    /// See [`FetchError::MalformedPayload`].
    MalformedPayload,
    /// See [`FetchError::WriteFailed`].
    WriteFailed,
    /// See [`FetchError::NameCollision`].
    NameCollision,
}

impl FetchError {
    /// Creates an unreachable error from a transport-level cause.
    pub fn unreachable(url: impl Into<String>, detail: impl ToString) -> Self {
        Self::Unreachable {
            url: url.into(),
            status: None,
            detail: detail.to_string(),
        }
    }

    /// Creates an unreachable error from a reqwest error.
    pub fn transport(url: impl Into<String>, error: &reqwest::Error) -> Self {
        let detail = if error.is_timeout() {
            "request timed out".to_string()
        } else {
            error.to_string()
        };
        Self::unreachable(url, detail)
    }

    /// Creates an unreachable error for a non-success HTTP status.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::Unreachable {
            url: url.into(),
            status: Some(status),
            detail: format!("HTTP {status}"),
        }
    }

    /// Creates an unreachable error for an expired per-fetch deadline.
    pub fn timed_out(url: impl Into<String>, after: std::time::Duration) -> Self {
        Self::unreachable(url, format!("timed out after {}s", after.as_secs()))
    }

    /// Maps an extraction failure on `url` to the matching fetch error.
    pub fn from_extraction(url: impl Into<String>, error: ExtractionError) -> Self {
        let url = url.into();
        match error {
            ExtractionError::MissingImage => Self::MissingImage { url },
            ExtractionError::MalformedPayload { reason } => Self::MalformedPayload { url, reason },
            ExtractionError::InvalidSelector { .. } => Self::MalformedPayload {
                url,
                reason: error.to_string(),
            },
        }
    }

    /// Creates a malformed-payload error.
    pub fn malformed(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a write error.
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns the serializable kind of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unreachable { .. } => FailureKind::Unreachable,
            Self::MissingImage { .. } => FailureKind::MissingImage,
            Self::MalformedPayload { .. } => FailureKind::MalformedPayload,
            Self::WriteFailed { .. } => FailureKind::WriteFailed,
            Self::NameCollision { .. } => FailureKind::NameCollision,
        }
    }
}
