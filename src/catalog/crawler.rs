//! Lazy traversal of the catalog tree.
//!
//! [`CatalogCrawler::open`] fetches the index and resolves the selected
//! sections; [`CatalogCrawler::next_leaf`] then walks sections and leaves in
//! document order, yielding one [`LeafBatch`] per reachable leaf-group.
//! Unreachable sections and leaves are recorded as [`BranchError`]s and
//! skipped.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{BranchError, DocumentEntry, Extractor, LeafContext, LinkRef, resolve_href};
use crate::download::{HttpClient, RetryPolicy, with_retry};
use crate::pipeline::{PipelineError, SectionSelection};

/// Documents of one leaf-group, ready to be named and dispatched.
#[derive(Debug, Clone)]
pub struct LeafBatch {
    /// The enclosing leaf-group.
    pub leaf: LeafContext,
    /// Display name of the section the leaf belongs to.
    pub section: String,
    /// Print-view base that this leaf's document links are re-rooted onto.
    pub print_base: String,
    /// Document entries in page order.
    pub entries: Vec<DocumentEntry>,
}

#[derive(Debug)]
struct SectionRef {
    name: String,
    url: String,
    print_base: String,
}

#[derive(Debug)]
struct LeafRef {
    link: LinkRef,
    url: String,
    section: String,
    print_base: String,
}

/// Walks index → sections → leaf-groups.
#[derive(Debug)]
pub struct CatalogCrawler {
    client: HttpClient,
    extractor: Arc<dyn Extractor>,
    retry: RetryPolicy,
    base_url: String,
    sections: VecDeque<SectionRef>,
    leaves: VecDeque<LeafRef>,
    branch_errors: Vec<BranchError>,
    sections_visited: usize,
}

impl CatalogCrawler {
    /// Fetches the index page and resolves the sections to crawl.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexUnreachable`] if the index page cannot be
    /// fetched after retries. Missing or unresolvable sections are recorded as
    /// branch errors instead.
    #[instrument(skip(client, extractor, retry, selection), fields(index = %index_url))]
    pub async fn open(
        client: HttpClient,
        extractor: Arc<dyn Extractor>,
        retry: RetryPolicy,
        base_url: &str,
        index_url: &str,
        print_url_base: &str,
        selection: &SectionSelection,
    ) -> Result<Self, PipelineError> {
        let page = with_retry(&retry, index_url, || client.fetch_page(index_url, None))
            .await
            .map_err(|(source, attempts)| {
                warn!(attempts, error = %source, "index unreachable");
                PipelineError::IndexUnreachable {
                    url: index_url.to_string(),
                    source,
                }
            })?;

        let mut crawler = Self {
            client,
            extractor,
            retry,
            base_url: base_url.to_string(),
            sections: VecDeque::new(),
            leaves: VecDeque::new(),
            branch_errors: Vec::new(),
            sections_visited: 0,
        };
        crawler.resolve_sections(&page, index_url, print_url_base, selection);
        info!(sections = crawler.sections.len(), "index parsed");
        Ok(crawler)
    }

    fn resolve_sections(
        &mut self,
        page: &str,
        index_url: &str,
        print_url_base: &str,
        selection: &SectionSelection,
    ) {
        match selection {
            SectionSelection::SkipPrefix(skip) => {
                let links = self.extractor.section_links(page);
                debug!(found = links.len(), skip, "section links");
                for link in links.into_iter().skip(*skip) {
                    self.push_section(&link, print_url_base.to_string());
                }
            }
            SectionSelection::Named(named) => {
                for wanted in named {
                    let Some(link) = self.extractor.link_by_label(page, &wanted.label) else {
                        warn!(label = %wanted.label, "section not found on index");
                        self.branch_errors.push(BranchError::section(
                            index_url,
                            format!("no section labelled {:?}", wanted.label),
                        ));
                        continue;
                    };
                    match resolve_href(print_url_base, &wanted.print_segment) {
                        Ok(print_base) => self.push_section(&link, print_base),
                        Err(e) => self.branch_errors.push(BranchError::section(index_url, e)),
                    }
                }
            }
        }
    }

    fn push_section(&mut self, link: &LinkRef, print_base: String) {
        match resolve_href(&self.base_url, &link.href) {
            Ok(url) => self.sections.push_back(SectionRef {
                name: link.display_name.clone(),
                url,
                print_base,
            }),
            Err(e) => {
                warn!(href = %link.href, "unresolvable section link");
                self.branch_errors.push(BranchError::section(&link.href, e));
            }
        }
    }

    /// Returns the next reachable leaf-group, or `None` when the tree is exhausted.
    pub async fn next_leaf(&mut self) -> Option<LeafBatch> {
        loop {
            if let Some(leaf) = self.leaves.pop_front() {
                match self.fetch(&leaf.url).await {
                    Ok(page) => {
                        let entries = self.extractor.document_entries(&page);
                        debug!(leaf = %leaf.link.display_name, documents = entries.len(), "leaf parsed");
                        return Some(LeafBatch {
                            leaf: LeafContext::from_link(&leaf.link, leaf.url),
                            section: leaf.section,
                            print_base: leaf.print_base,
                            entries,
                        });
                    }
                    Err(reason) => {
                        warn!(url = %leaf.url, %reason, "leaf unreachable, skipping");
                        self.branch_errors.push(BranchError::leaf(leaf.url, reason));
                        continue;
                    }
                }
            }

            let section = self.sections.pop_front()?;
            self.sections_visited += 1;
            match self.fetch(&section.url).await {
                Ok(page) => {
                    let links = self.extractor.leaf_links(&page);
                    info!(section = %section.name, leaves = links.len(), "section parsed");
                    for link in links {
                        match resolve_href(&self.base_url, &link.href) {
                            Ok(url) => self.leaves.push_back(LeafRef {
                                link,
                                url,
                                section: section.name.clone(),
                                print_base: section.print_base.clone(),
                            }),
                            Err(e) => self.branch_errors.push(BranchError::leaf(&link.href, e)),
                        }
                    }
                }
                Err(reason) => {
                    warn!(url = %section.url, %reason, "section unreachable, skipping");
                    self.branch_errors
                        .push(BranchError::section(section.url, reason));
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, crate::download::FetchError> {
        with_retry(&self.retry, url, || self.client.fetch_page(url, None))
            .await
            .map_err(|(e, _)| e)
    }

    /// Number of sections still queued.
    #[must_use]
    pub fn sections_pending(&self) -> usize {
        self.sections.len()
    }

    /// Number of section pages visited so far.
    #[must_use]
    pub fn sections_visited(&self) -> usize {
        self.sections_visited
    }

    /// Drains the branch errors recorded so far.
    pub fn take_branch_errors(&mut self) -> Vec<BranchError> {
        std::mem::take(&mut self.branch_errors)
    }
}
