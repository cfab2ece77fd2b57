//! File configuration for CLI defaults.
//!
//! A small `key = value` format: strings are double-quoted, integers and
//! booleans bare, `#` starts a comment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chartfetch_core::{InfoDocPolicy, OutputMode, Preset, SectionSelection};

/// Values read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Catalog preset the other values are layered on.
    pub preset: Option<Preset>,
    /// Output root directory.
    pub output_dir: Option<PathBuf>,
    /// Catalog base URL.
    pub base_url: Option<String>,
    /// Index page relative to the base URL.
    pub index_page: Option<String>,
    /// Print-view base URL.
    pub print_url: Option<String>,
    /// Skip the first N section links.
    pub skip_sections: Option<usize>,
    /// Named sections (`label=SEGMENT; ...`).
    pub sections: Option<SectionSelection>,
    /// Output layout.
    pub output_mode: Option<OutputMode>,
    /// Info document policy.
    pub info_docs: Option<InfoDocPolicy>,
    /// Title prefix of info documents.
    pub info_prefix: Option<String>,
    /// Token replacing the first space of a document name.
    pub name_separator: Option<String>,
    /// Suffix of renamed info documents.
    pub info_suffix: Option<String>,
    /// Subdirectory for per-document files.
    pub document_subdir: Option<String>,
    /// File name of the appended document.
    pub append_file: Option<String>,
    /// Concurrency (1..=100).
    pub concurrency: Option<u8>,
    /// Per-fetch deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Retries for transient failures.
    pub max_retries: Option<u8>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Manifest copied into the output root.
    pub manifest: Option<PathBuf>,
    /// Package the output root after the run.
    pub archive: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }
        if let Some(retries) = self.max_retries
            && retries > 9
        {
            bail!("Invalid config value for `max_retries`: {retries}. Expected range: 0..=9");
        }
        validate_timeout_secs("timeout_secs", self.timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.skip_sections.is_some() && self.sections.is_some() {
            bail!("`skip_sections` and `sections` are mutually exclusive");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/chartfetch/config.toml`
/// 2. `$HOME/.config/chartfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("chartfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("chartfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "preset" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.preset = Some(parsed.parse::<Preset>().with_context(context)?);
            }
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "base_url" => cfg.base_url = Some(parse_string_literal(value).with_context(context)?),
            "index_page" => {
                cfg.index_page = Some(parse_string_literal(value).with_context(context)?);
            }
            "print_url" => cfg.print_url = Some(parse_string_literal(value).with_context(context)?),
            "skip_sections" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                cfg.skip_sections = Some(usize::try_from(parsed).with_context(context)?);
            }
            "sections" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.sections = Some(SectionSelection::parse_named(&parsed).with_context(context)?);
            }
            "output_mode" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.output_mode = Some(parsed.parse::<OutputMode>().with_context(context)?);
            }
            "info_docs" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.info_docs = Some(
                    parsed
                        .parse::<InfoDocPolicy>()
                        .map_err(anyhow::Error::msg)
                        .with_context(context)?,
                );
            }
            "info_prefix" => {
                cfg.info_prefix = Some(parse_string_literal(value).with_context(context)?);
            }
            "name_separator" => {
                cfg.name_separator = Some(parse_string_literal(value).with_context(context)?);
            }
            "info_suffix" => {
                cfg.info_suffix = Some(parse_string_literal(value).with_context(context)?);
            }
            "document_subdir" => {
                cfg.document_subdir = Some(parse_string_literal(value).with_context(context)?);
            }
            "append_file" => {
                cfg.append_file = Some(parse_string_literal(value).with_context(context)?);
            }
            "concurrency" => cfg.concurrency = Some(parse_integer_u8(value).with_context(context)?),
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_retries" => cfg.max_retries = Some(parse_integer_u8(value).with_context(context)?),
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "manifest" => {
                cfg.manifest = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "archive" => cfg.archive = Some(parse_boolean(value).with_context(context)?),
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let value = parse_integer_u64(raw_value)?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartfetch_core::NamedSection;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
            # mirror settings
            preset = "aip"
            output_dir = "/srv/charts" # trailing comment
            concurrency = 4
            archive = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.preset, Some(Preset::Aip));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/srv/charts")));
        assert_eq!(cfg.concurrency, Some(4));
        assert_eq!(cfg.archive, Some(true));
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn test_parse_config_catalog_overrides() {
        let cfg = parse_config_str(
            r#"
            base_url = "https://aip.example/2025JAN01/chapter"
            index_page = "abc.html"
            print_url = "https://aip.example/print"
            sections = "GEN Allgemeine Information=GEN; ENR Streckeninformation=ENR"
            output_mode = "append"
            info_docs = "rename"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.sections,
            Some(SectionSelection::Named(vec![
                NamedSection::new("GEN Allgemeine Information", "GEN"),
                NamedSection::new("ENR Streckeninformation", "ENR"),
            ]))
        );
        assert_eq!(cfg.output_mode, Some(OutputMode::AppendedSinglePdf));
        assert_eq!(cfg.info_docs, Some(InfoDocPolicy::RenameUsingLeafId));
    }

    #[test]
    fn test_parse_config_hash_inside_string_kept() {
        let cfg = parse_config_str(r#"name_separator = "_#_""#).unwrap();
        assert_eq!(cfg.name_separator.as_deref(), Some("_#_"));
    }

    #[test]
    fn test_parse_config_unknown_key_reports_line() {
        let err = parse_config_str("concurrency = 2\nrate_limit = 5").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("output_dir = /tmp").unwrap_err();
        assert!(format!("{err:#}").contains("double-quoted"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        assert!(parse_config_str("concurrency = 0").is_err());
        assert!(parse_config_str("max_retries = 12").is_err());
        assert!(parse_config_str("timeout_secs = 0").is_err());
        assert!(parse_config_str("preset = \"gen\"").is_err());
    }

    #[test]
    fn test_parse_config_rejects_conflicting_section_selection() {
        let err = parse_config_str("skip_sections = 3\nsections = \"GEN=GEN\"").unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_file_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_retries = 1\n").unwrap();
        let cfg = load_file_config(Some(&path)).unwrap().unwrap();
        assert_eq!(cfg.max_retries, Some(1));
    }
}
