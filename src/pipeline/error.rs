//! Run-level errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::ExtractionError;
use crate::download::FetchError;

/// Errors that abort a run before or instead of producing a summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The index page could not be fetched; there is nothing to traverse.
    #[error("index page unreachable {url}: {source}")]
    IndexUnreachable {
        /// Index URL.
        url: String,
        /// Final fetch error.
        #[source]
        source: FetchError,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The output root or its subdirectory could not be prepared.
    #[error("failed to prepare output at {path}: {source}")]
    OutputSetup {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTML extractor could not be built.
    #[error("extractor setup failed: {0}")]
    Extractor(#[from] ExtractionError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required value is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Configuration key.
        field: &'static str,
    },

    /// A value cannot be used as given.
    #[error("invalid {field}: {value:?}")]
    Invalid {
        /// Configuration key.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// Concurrency outside the accepted range.
    #[error("invalid concurrency value {value}: must be between {min} and {max}")]
    ConcurrencyOutOfRange {
        /// Given value.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// Attempt count outside the accepted range.
    #[error("invalid max attempts {value}: must be between 1 and {max}")]
    AttemptsOutOfRange {
        /// Given value.
        value: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// A timeout of zero.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Configuration key.
        field: &'static str,
    },

    /// No preset with this name.
    #[error("unknown preset '{name}' (expected ad, ad-info or aip)")]
    UnknownPreset {
        /// Requested name.
        name: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.into(),
        }
    }
}
