//! Extraction of typed catalog data from raw HTML.
//!
//! The [`Extractor`] trait is the only place the pipeline knows anything about
//! markup. [`HtmlExtractor`] implements it for the published catalog layout:
//!
//! - section and leaf links are `a.folder-link` anchors whose label sits in a
//!   language-tagged `span` (`<span class="folder-name" lang="en">`)
//! - document entries are `li.document-item` elements holding one link and
//!   one language-tagged label
//! - a print-view page embeds the chart as an `img` with a base64 `data:` URI

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use scraper::{ElementRef, Html, Selector};

use super::{DocumentEntry, ExtractionError, LinkRef};

/// Label language used when none is configured.
pub const DEFAULT_LABEL_LANG: &str = "en";

/// Pure transformation of page content into catalog data.
///
/// Implementations must be free of side effects; the crawler and fetcher
/// call them from concurrent tasks.
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// All top-level category links on the index page, in document order.
    fn section_links(&self, page: &str) -> Vec<LinkRef>;

    /// The link whose label text equals `label` exactly, if present.
    fn link_by_label(&self, page: &str, label: &str) -> Option<LinkRef>;

    /// Links to leaf-groups within a section page.
    fn leaf_links(&self, page: &str) -> Vec<LinkRef>;

    /// Document records within a leaf-group page.
    fn document_entries(&self, page: &str) -> Vec<DocumentEntry>;

    /// Raw bytes of the first embedded image on a rendering page.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::MissingImage`] when the page has no image element,
    /// [`ExtractionError::MalformedPayload`] when its payload cannot be decoded.
    fn embedded_image(&self, page: &str) -> Result<Vec<u8>, ExtractionError>;
}

/// [`Extractor`] for the published catalog markup, backed by `scraper`.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    folder_link: Selector,
    label: Selector,
    any_span: Selector,
    any_link: Selector,
    document_item: Selector,
    image: Selector,
    info_prefix: String,
}

impl HtmlExtractor {
    /// Creates an extractor reading English labels and classifying documents
    /// whose title starts with `info_prefix` as information documents.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidSelector`] if a selector fails to compile.
    pub fn new(info_prefix: impl Into<String>) -> Result<Self, ExtractionError> {
        Self::with_label_lang(info_prefix, DEFAULT_LABEL_LANG)
    }

    /// Creates an extractor reading labels tagged with `lang`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidSelector`] if a selector fails to compile.
    pub fn with_label_lang(
        info_prefix: impl Into<String>,
        lang: &str,
    ) -> Result<Self, ExtractionError> {
        Ok(Self {
            folder_link: selector("a.folder-link[href]")?,
            label: selector(&format!(r#"span[lang="{lang}"]"#))?,
            any_span: selector("span")?,
            any_link: selector("a[href]")?,
            document_item: selector("li.document-item")?,
            image: selector("img")?,
            info_prefix: info_prefix.into(),
        })
    }

    fn links(&self, page: &str) -> Vec<LinkRef> {
        let document = Html::parse_document(page);
        document
            .select(&self.folder_link)
            .filter_map(|anchor| {
                let href = non_empty_href(anchor)?;
                let name = anchor
                    .select(&self.label)
                    .next()
                    .map_or_else(|| element_text(anchor), element_text);
                Some(LinkRef::new(href, name))
            })
            .collect()
    }
}

impl Extractor for HtmlExtractor {
    fn section_links(&self, page: &str) -> Vec<LinkRef> {
        self.links(page)
    }

    fn link_by_label(&self, page: &str, label: &str) -> Option<LinkRef> {
        let document = Html::parse_document(page);
        document.select(&self.any_link).find_map(|anchor| {
            let labelled = anchor
                .select(&self.any_span)
                .any(|span| element_text(span) == label);
            if !labelled {
                return None;
            }
            non_empty_href(anchor).map(|href| LinkRef::new(href, label))
        })
    }

    fn leaf_links(&self, page: &str) -> Vec<LinkRef> {
        self.links(page)
    }

    fn document_entries(&self, page: &str) -> Vec<DocumentEntry> {
        let document = Html::parse_document(page);
        document
            .select(&self.document_item)
            .filter_map(|item| {
                let href = item.select(&self.any_link).next().and_then(non_empty_href)?;
                let name = element_text(item.select(&self.label).next()?);
                Some(DocumentEntry::new(href, name, &self.info_prefix))
            })
            .collect()
    }

    fn embedded_image(&self, page: &str) -> Result<Vec<u8>, ExtractionError> {
        let document = Html::parse_document(page);
        let img = document
            .select(&self.image)
            .next()
            .ok_or(ExtractionError::MissingImage)?;
        let src = img
            .value()
            .attr("src")
            .ok_or_else(|| ExtractionError::malformed("image element has no src attribute"))?;
        decode_data_uri(src)
    }
}

/// Decodes a `data:<mime>;base64,<payload>` URI into raw bytes.
///
/// # Errors
///
/// Returns [`ExtractionError::MalformedPayload`] for non-data URIs, non-base64
/// encodings, empty payloads and invalid base64.
pub fn decode_data_uri(src: &str) -> Result<Vec<u8>, ExtractionError> {
    let rest = src
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| ExtractionError::malformed("image source is not an inline data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExtractionError::malformed("data URI has no payload separator"))?;
    if !meta.to_ascii_lowercase().ends_with(";base64") {
        return Err(ExtractionError::malformed(format!(
            "unsupported data URI encoding {meta:?}"
        )));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ExtractionError::malformed("data URI payload is empty"));
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ExtractionError::malformed(format!("invalid base64: {e}")))
}

fn selector(source: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(source).map_err(|e| ExtractionError::InvalidSelector {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

fn non_empty_href(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Element text with runs of whitespace collapsed to single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
