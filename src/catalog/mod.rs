//! Catalog data model and link resolution.
//!
//! The remote catalog is a fixed-depth tree: an index page links to
//! sections, sections link to leaf-groups (one per airfield or chapter),
//! and leaf-groups list the chart documents. Every link found on a page is
//! relative to a fixed catalog base; document links are additionally
//! re-rooted onto a separate print-view base before they are fetched.
//!
//! # Example
//!
//! ```
//! use chartfetch_core::catalog::{print_url, resolve_href};
//!
//! let url = resolve_href("https://aip.example/chapter/", "abc.html").unwrap();
//! assert_eq!(url, "https://aip.example/chapter/abc.html");
//!
//! let print = print_url("https://aip.example/print/AD", "../pages/xyz.html").unwrap();
//! assert_eq!(print, "https://aip.example/print/AD/xyz.html");
//! ```

mod crawler;
mod error;
pub mod extract;

pub use crawler::{CatalogCrawler, LeafBatch};
pub use error::{BranchError, ExtractionError, LinkError};
pub use extract::{Extractor, HtmlExtractor};

use url::Url;

/// Relative path prefix that leaf pages use for document links.
const PAGES_PREFIX: &str = "../pages";

/// A reference discovered on a catalog page.
///
/// `href` is relative to the catalog base and must be resolved with
/// [`resolve_href`] before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Relative link target (never empty).
    pub href: String,
    /// Human-readable label of the link.
    pub display_name: String,
}

impl LinkRef {
    /// Creates a link reference.
    #[must_use]
    pub fn new(href: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            display_name: display_name.into(),
        }
    }
}

/// A document listed on a leaf-group page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// Relative print-view link of the document.
    pub href: String,
    /// Human-readable document title.
    pub display_name: String,
    /// True when the title carries the reserved information-document prefix.
    pub is_info_class: bool,
}

impl DocumentEntry {
    /// Creates a document entry, classifying it against `info_prefix`.
    #[must_use]
    pub fn new(href: impl Into<String>, display_name: impl Into<String>, info_prefix: &str) -> Self {
        let display_name = display_name.into();
        let is_info_class = !info_prefix.is_empty() && display_name.starts_with(info_prefix);
        Self {
            href: href.into(),
            display_name,
            is_info_class,
        }
    }
}

/// Identity of the leaf-group that encloses a batch of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafContext {
    /// Short identifier: the last whitespace-delimited token of the name
    /// (an ICAO code for airfields), or the href stem when the name is blank.
    pub leaf_id: String,
    /// Human-readable leaf name, e.g. `Example Airport EDXY`.
    pub display_name: String,
    /// Resolved URL of the leaf page, sent as referer for document requests.
    pub url: String,
}

impl LeafContext {
    /// Builds the leaf identity from its link and resolved URL.
    #[must_use]
    pub fn from_link(link: &LinkRef, url: impl Into<String>) -> Self {
        let leaf_id = link
            .display_name
            .split_whitespace()
            .next_back()
            .map_or_else(|| href_stem(&link.href), str::to_string);
        Self {
            leaf_id,
            display_name: link.display_name.clone(),
            url: url.into(),
        }
    }
}

fn href_stem(href: &str) -> String {
    let last = href.rsplit('/').next().unwrap_or(href);
    last.split_once('.').map_or(last, |(stem, _)| stem).to_string()
}

/// Resolves a catalog-relative `href` against `base`.
///
/// The result is `base + "/" + href` with exactly one slash at the seam;
/// query strings and fragments are carried over untouched.
///
/// # Errors
///
/// Returns [`LinkError`] when `href` is empty or the joined string is not
/// an absolute URL.
pub fn resolve_href(base: &str, href: &str) -> Result<String, LinkError> {
    join_url(base, href)
}

/// Re-roots a leaf page's document link onto the print-view base.
///
/// Leaf pages link documents as `../pages/<id>.html`; the print view serves
/// the same document at `<print_base>/<id>.html`.
///
/// # Errors
///
/// Returns [`LinkError`] when the link is empty or the result is not an
/// absolute URL.
pub fn print_url(print_base: &str, href: &str) -> Result<String, LinkError> {
    let relative = href.strip_prefix(PAGES_PREFIX).unwrap_or(href);
    join_url(print_base, relative)
}

fn join_url(base: &str, href: &str) -> Result<String, LinkError> {
    let relative = href.trim().trim_start_matches('/');
    if relative.is_empty() {
        return Err(LinkError::new(base, href));
    }
    let joined = format!("{}/{relative}", base.trim_end_matches('/'));
    Url::parse(&joined).map_err(|_| LinkError::new(base, href))?;
    Ok(joined)
}
