//! Error types for catalog extraction and traversal.

use thiserror::Error;

/// Errors produced while pulling structured data out of a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The rendering page carries no image element.
    #[error("no embedded image found on page")]
    MissingImage,

    /// The image element exists but its payload cannot be decoded.
    #[error("malformed image payload: {reason}")]
    MalformedPayload {
        /// What was wrong with the payload.
        reason: String,
    },

    /// A CSS selector used by the extractor failed to compile.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector source text.
        selector: String,
        /// Parser message.
        reason: String,
    },
}

impl ExtractionError {
    /// Creates a malformed-payload error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }
}

/// A catalog link that cannot be turned into an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve link {href:?} against {base}")]
pub struct LinkError {
    /// Base the link was resolved against.
    pub base: String,
    /// The offending relative link.
    pub href: String,
}

impl LinkError {
    pub(crate) fn new(base: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            href: href.into(),
        }
    }
}

/// A crawl branch that was skipped. The run continues with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchError {
    /// A section page could not be fetched or located.
    #[error("section unreachable {url}: {reason}")]
    SectionUnreachable {
        /// Section URL (or the index URL when a named section is absent).
        url: String,
        /// Why the branch was skipped.
        reason: String,
    },

    /// A leaf-group page could not be fetched.
    #[error("leaf unreachable {url}: {reason}")]
    LeafUnreachable {
        /// Leaf URL, or the raw href when it could not be resolved.
        url: String,
        /// Why the branch was skipped.
        reason: String,
    },
}

impl BranchError {
    /// Creates a section error.
    pub fn section(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::SectionUnreachable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a leaf error.
    pub fn leaf(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::LeafUnreachable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// URL of the skipped branch.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::SectionUnreachable { url, .. } | Self::LeafUnreachable { url, .. } => url,
        }
    }
}
