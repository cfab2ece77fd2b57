//! Run configuration and built-in catalog presets.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::ConfigError;
use crate::catalog::resolve_href;
use crate::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, FETCH_TIMEOUT_SECS, READ_TIMEOUT_SECS, RetryPolicy,
};
use crate::naming::{self, InfoDocPolicy, NamingPolicy, sanitize_filename};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of documents fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Maximum retry attempts accepted from configuration.
const MAX_ATTEMPTS_LIMIT: u32 = 10;

const DEFAULT_INFO_PREFIX: &str = "AD";
const DEFAULT_DOCUMENT_SUBDIR: &str = "byop";
const DEFAULT_APPEND_FILE: &str = "VFR_AIP.pdf";
const DEFAULT_OUTPUT_DIR: &str = "output";

/// How converted documents are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One PDF per document in the document subdirectory.
    PerDocumentFile,
    /// All pages appended to one multi-page PDF.
    AppendedSinglePdf,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-document" | "per_document" | "files" => Ok(Self::PerDocumentFile),
            "append" | "single" | "single-pdf" => Ok(Self::AppendedSinglePdf),
            other => Err(ConfigError::invalid("output_mode", other)),
        }
    }
}

/// A section picked from the index by its exact label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSection {
    /// Label text on the index page.
    pub label: String,
    /// Path segment appended to the print-view base for this section.
    pub print_segment: String,
}

impl NamedSection {
    /// Creates a named section.
    #[must_use]
    pub fn new(label: impl Into<String>, print_segment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            print_segment: print_segment.into(),
        }
    }
}

/// Which index links are crawled as sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSelection {
    /// Every section link after the first `n` (navigation links precede content).
    SkipPrefix(usize),
    /// Only these sections, each with its own print-view segment.
    Named(Vec<NamedSection>),
}

impl SectionSelection {
    /// Parses `label=SEGMENT; label=SEGMENT`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for entries without `=` or with an empty side.
    pub fn parse_named(spec: &str) -> Result<Self, ConfigError> {
        let mut sections = Vec::new();
        for part in spec.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((label, segment)) = part.rsplit_once('=') else {
                return Err(ConfigError::invalid("sections", part));
            };
            let (label, segment) = (label.trim(), segment.trim());
            if label.is_empty() || segment.is_empty() {
                return Err(ConfigError::invalid("sections", part));
            }
            sections.push(NamedSection::new(label, segment));
        }
        Ok(Self::Named(sections))
    }
}

/// Built-in catalog configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Airfield charts, one file each, info documents skipped.
    Airfields,
    /// Airfield charts, one file each, info documents renamed per airfield.
    AirfieldsWithInfo,
    /// GEN and ENR chapters appended into one PDF.
    Aip,
}

impl Preset {
    /// All presets, in help order.
    pub const ALL: [Self; 3] = [Self::Airfields, Self::AirfieldsWithInfo, Self::Aip];

    /// Command-line name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Airfields => "ad",
            Self::AirfieldsWithInfo => "ad-info",
            Self::Aip => "aip",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == wanted)
            .ok_or(ConfigError::UnknownPreset { name: wanted })
    }
}

/// Everything that varies between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Catalog base every relative link is resolved against.
    pub base_url: String,
    /// Index page, relative to `base_url`.
    pub index_page_id: String,
    /// Print-view base document links are re-rooted onto.
    pub print_url_base: String,
    /// Which index links become sections.
    pub section_selection: SectionSelection,
    /// File layout of the output.
    pub output_mode: OutputMode,
    /// Treatment of info-class documents.
    pub info_doc_policy: InfoDocPolicy,
    /// Title prefix marking info-class documents. Empty disables the class.
    pub info_prefix: String,
    /// Token replacing the first space of a document name.
    pub name_separator: String,
    /// Suffix of renamed info-class documents.
    pub info_suffix: String,
    /// Output root.
    pub output_dir: PathBuf,
    /// Subdirectory of the root holding per-document files.
    pub per_document_subdir: String,
    /// File name of the appended document inside the root.
    pub append_file_name: String,
    /// Documents fetched at once.
    pub concurrency: usize,
    /// Deadline for one page fetch.
    pub fetch_timeout: Duration,
    /// Attempts per page, including the first.
    pub max_attempts: u32,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Per-request read timeout.
    pub read_timeout: Duration,
}

impl PipelineConfig {
    /// Configuration for `preset` with default output and network settings.
    #[must_use]
    pub fn from_preset(preset: Preset) -> Self {
        let (base_url, index_page_id, print_url_base, section_selection, output_mode, policy) =
            match preset {
                Preset::Airfields => (
                    "https://aip.dfs.de/BasicVFR/2023NOV22/chapter",
                    "344b4b4a595a3a801450b6ad348bc7b3.html",
                    "https://aip.dfs.de/basicVFR/print/AD",
                    SectionSelection::SkipPrefix(3),
                    OutputMode::PerDocumentFile,
                    InfoDocPolicy::Skip,
                ),
                Preset::AirfieldsWithInfo => (
                    "https://aip.dfs.de/BasicVFR/2024MAR07/chapter",
                    "dc740af5fe2e7014197f8b8433ff6926.html",
                    "https://aip.dfs.de/basicVFR/print/AD",
                    SectionSelection::SkipPrefix(3),
                    OutputMode::PerDocumentFile,
                    InfoDocPolicy::RenameUsingLeafId,
                ),
                Preset::Aip => (
                    "https://aip.dfs.de/BasicVFR/2024MAR07/chapter",
                    "3244a398014823f13ace4090907c74e3.html",
                    "https://aip.dfs.de/basicVFR/print",
                    SectionSelection::Named(vec![
                        NamedSection::new("GEN Allgemeine Information", "GEN"),
                        NamedSection::new("ENR Streckeninformation", "ENR"),
                    ]),
                    OutputMode::AppendedSinglePdf,
                    InfoDocPolicy::Skip,
                ),
            };
        // GEN/ENR documents are appended whatever their title.
        let info_prefix = match preset {
            Preset::Aip => "",
            Preset::Airfields | Preset::AirfieldsWithInfo => DEFAULT_INFO_PREFIX,
        };

        Self {
            base_url: base_url.to_string(),
            index_page_id: index_page_id.to_string(),
            print_url_base: print_url_base.to_string(),
            section_selection,
            output_mode,
            info_doc_policy: policy,
            info_prefix: info_prefix.to_string(),
            name_separator: naming::DEFAULT_SEPARATOR.to_string(),
            info_suffix: naming::DEFAULT_INFO_SUFFIX.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            per_document_subdir: DEFAULT_DOCUMENT_SUBDIR.to_string(),
            append_file_name: DEFAULT_APPEND_FILE.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }

    /// Absolute index page URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the index page cannot be resolved.
    pub fn index_url(&self) -> Result<String, ConfigError> {
        resolve_href(&self.base_url, &self.index_page_id)
            .map_err(|_| ConfigError::invalid("index_page", &self.index_page_id))
    }

    /// Directory receiving per-document files.
    #[must_use]
    pub fn document_dir(&self) -> PathBuf {
        self.output_dir.join(&self.per_document_subdir)
    }

    /// Path of the appended document.
    #[must_use]
    pub fn append_path(&self) -> PathBuf {
        self.output_dir.join(&self.append_file_name)
    }

    /// Naming policy built from the configured tokens.
    #[must_use]
    pub fn naming_policy(&self) -> NamingPolicy {
        NamingPolicy::with_tokens(self.info_doc_policy, &self.name_separator, &self.info_suffix)
    }

    /// Retry policy for page fetches.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.max_attempts)
    }

    /// Checks every field for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("base_url", &self.base_url)?;
        validate_base_url("print_url", &self.print_url_base)?;
        if self.index_page_id.trim().is_empty() {
            return Err(ConfigError::Empty { field: "index_page" });
        }
        self.index_url()?;

        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::ConcurrencyOutOfRange {
                value: self.concurrency,
                min: MIN_CONCURRENCY,
                max: MAX_CONCURRENCY,
            });
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(ConfigError::AttemptsOutOfRange {
                value: self.max_attempts,
                max: MAX_ATTEMPTS_LIMIT,
            });
        }
        for (field, value) in [
            ("timeout", self.fetch_timeout),
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroTimeout { field });
            }
        }

        for (field, value) in [
            ("name_separator", &self.name_separator),
            ("info_suffix", &self.info_suffix),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        for (field, value) in [
            ("document_subdir", &self.per_document_subdir),
            ("append_file", &self.append_file_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
            if sanitize_filename(value) != *value {
                return Err(ConfigError::invalid(field, value));
            }
        }

        if let SectionSelection::Named(sections) = &self.section_selection {
            if sections.is_empty() {
                return Err(ConfigError::Empty { field: "sections" });
            }
        }
        Ok(())
    }
}

fn validate_base_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty { field });
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::invalid(field, value)),
    }
}
