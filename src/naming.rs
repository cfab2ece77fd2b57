//! Output naming for chart documents.
//!
//! A document's output name comes from its display name, except for
//! info-class documents (leaf summaries such as `AD 2 EDXY`), which are either
//! skipped or renamed after the enclosing leaf depending on [`InfoDocPolicy`].

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::catalog::{DocumentEntry, LeafContext};

/// Default token that replaces the first space of a display name.
pub const DEFAULT_SEPARATOR: &str = "_VFR-AIP_";

/// Default suffix for renamed info-class documents.
pub const DEFAULT_INFO_SUFFIX: &str = "VFR-AIP_Info";

/// What to do with info-class documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InfoDocPolicy {
    /// Create no task for them.
    Skip,
    /// Name them `<leaf id>_<info suffix>`.
    RenameUsingLeafId,
}

impl std::str::FromStr for InfoDocPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "rename" | "rename-using-leaf-id" => Ok(Self::RenameUsingLeafId),
            other => Err(format!("unknown info document policy '{other}' (expected skip or rename)")),
        }
    }
}

/// Derives output names for document entries.
///
/// # Example
///
/// ```
/// use chartfetch_core::catalog::{DocumentEntry, LeafContext, LinkRef};
/// use chartfetch_core::naming::{InfoDocPolicy, NamingPolicy};
///
/// let policy = NamingPolicy::new(InfoDocPolicy::RenameUsingLeafId);
/// let leaf = LeafContext::from_link(
///     &LinkRef::new("leaf.html", "Example Airport EDXY"),
///     "https://aip.example/chapter/leaf.html",
/// );
///
/// let chart = DocumentEntry::new("../pages/a.html", "VFR Chart ICAO", "AD");
/// assert_eq!(policy.name(&chart, &leaf).as_deref(), Some("VFR_VFR-AIP_Chart ICAO"));
///
/// let info = DocumentEntry::new("../pages/b.html", "AD 2 EDXY", "AD");
/// assert_eq!(policy.name(&info, &leaf).as_deref(), Some("EDXY_VFR-AIP_Info"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    separator: String,
    info_suffix: String,
    info_docs: InfoDocPolicy,
}

impl NamingPolicy {
    /// Creates a policy with the default separator and info suffix.
    #[must_use]
    pub fn new(info_docs: InfoDocPolicy) -> Self {
        Self::with_tokens(info_docs, DEFAULT_SEPARATOR, DEFAULT_INFO_SUFFIX)
    }

    /// Creates a policy with explicit separator and info suffix tokens.
    #[must_use]
    pub fn with_tokens(
        info_docs: InfoDocPolicy,
        separator: impl Into<String>,
        info_suffix: impl Into<String>,
    ) -> Self {
        Self {
            separator: separator.into(),
            info_suffix: info_suffix.into(),
            info_docs,
        }
    }

    /// The configured info-class policy.
    #[must_use]
    pub fn info_docs(&self) -> InfoDocPolicy {
        self.info_docs
    }

    /// Returns the output name for `entry`, or `None` when no task should be created.
    ///
    /// The result is passed through [`sanitize_filename`], so it is always a
    /// single safe path segment without extension.
    #[must_use]
    pub fn name(&self, entry: &DocumentEntry, leaf: &LeafContext) -> Option<String> {
        let raw = if entry.is_info_class {
            match self.info_docs {
                InfoDocPolicy::Skip => return None,
                InfoDocPolicy::RenameUsingLeafId => {
                    format!("{}_{}", leaf.leaf_id, self.info_suffix)
                }
            }
        } else {
            entry.display_name.replacen(' ', &self.separator, 1)
        };
        Some(sanitize_filename(&raw))
    }
}

/// Replaces characters that are unsafe in a file name.
///
/// Path separators, reserved punctuation and control characters become `_`.
/// A result that would still be a dot segment has its dots replaced too.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::LinkRef;

    fn leaf(name: &str) -> LeafContext {
        LeafContext::from_link(&LinkRef::new("leaf.html", name), "https://x/leaf.html")
    }

    fn entry(name: &str) -> DocumentEntry {
        DocumentEntry::new("../pages/doc.html", name, "AD")
    }

    #[test]
    fn test_default_rule_replaces_first_space_only() {
        let policy = NamingPolicy::new(InfoDocPolicy::Skip);
        assert_eq!(
            policy.name(&entry("VFR Chart ICAO"), &leaf("Example Airport EDXY")),
            Some("VFR_VFR-AIP_Chart ICAO".to_string())
        );
    }

    #[test]
    fn test_default_rule_without_space_is_unchanged() {
        let policy = NamingPolicy::new(InfoDocPolicy::Skip);
        assert_eq!(
            policy.name(&entry("Overview"), &leaf("Example Airport EDXY")),
            Some("Overview".to_string())
        );
    }

    #[test]
    fn test_info_doc_skipped() {
        let policy = NamingPolicy::new(InfoDocPolicy::Skip);
        assert_eq!(policy.name(&entry("AD 2 EDXY"), &leaf("Example Airport EDXY")), None);
    }

    #[test]
    fn test_info_doc_renamed_after_leaf() {
        let policy = NamingPolicy::new(InfoDocPolicy::RenameUsingLeafId);
        assert_eq!(
            policy.name(&entry("AD 2 EDXY"), &leaf("Example Airport EDXY")),
            Some("EDXY_VFR-AIP_Info".to_string())
        );
    }

    #[test]
    fn test_rename_does_not_affect_regular_docs() {
        let policy = NamingPolicy::new(InfoDocPolicy::RenameUsingLeafId);
        assert_eq!(
            policy.name(&entry("Aerodrome Chart"), &leaf("Example Airport EDXY")),
            Some("Aerodrome_VFR-AIP_Chart".to_string())
        );
    }

    #[test]
    fn test_rename_uses_leaf_identifier() {
        let policy = NamingPolicy::new(InfoDocPolicy::RenameUsingLeafId);
        let leaf = LeafContext {
            leaf_id: "EDQQ".to_string(),
            display_name: "Renamed Field EDXY".to_string(),
            url: "https://x/leaf.html".to_string(),
        };
        assert_eq!(
            policy.name(&entry("AD 2 EDXY"), &leaf),
            Some("EDQQ_VFR-AIP_Info".to_string())
        );
    }

    #[test]
    fn test_rename_falls_back_to_leaf_id_for_blank_leaf_name() {
        let policy = NamingPolicy::new(InfoDocPolicy::RenameUsingLeafId);
        let leaf = LeafContext::from_link(&LinkRef::new("pages/edzz.html", "  "), "https://x/p");
        assert_eq!(
            policy.name(&entry("AD 2"), &leaf),
            Some("edzz_VFR-AIP_Info".to_string())
        );
    }

    #[test]
    fn test_custom_tokens() {
        let policy = NamingPolicy::with_tokens(InfoDocPolicy::RenameUsingLeafId, "__", "INFO");
        assert_eq!(
            policy.name(&entry("Chart 1"), &leaf("Field EDAA")),
            Some("Chart__1".to_string())
        );
        assert_eq!(
            policy.name(&entry("AD info"), &leaf("Field EDAA")),
            Some("EDAA_INFO".to_string())
        );
    }

    #[test]
    fn test_name_is_sanitized() {
        let policy = NamingPolicy::new(InfoDocPolicy::Skip);
        assert_eq!(
            policy.name(&entry("Chart 1/2: north"), &leaf("Field EDAA")),
            Some("Chart_VFR-AIP_1_2_ north".to_string())
        );
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename(""), "_");
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("EDXY_VFR-AIP_Info"), "EDXY_VFR-AIP_Info");
        assert_eq!(sanitize_filename("Karte (1)"), "Karte (1)");
    }

    #[test]
    fn test_info_doc_policy_from_str() {
        assert_eq!("skip".parse::<InfoDocPolicy>().unwrap(), InfoDocPolicy::Skip);
        assert_eq!(
            "Rename".parse::<InfoDocPolicy>().unwrap(),
            InfoDocPolicy::RenameUsingLeafId
        );
        assert!("drop".parse::<InfoDocPolicy>().is_err());
    }
}
