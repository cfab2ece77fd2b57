//! Configuration lifecycle: load file config, layer it and the CLI over a preset.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chartfetch_core::{
    AssemblerChain, ManifestCopy, PipelineConfig, Preset, SectionSelection, ZipArchive,
};

use crate::app_config::{FileConfig, load_file_config};
use crate::cli::Args;

/// Resolved configuration bundle handed to the runtime.
pub(crate) struct ResolvedConfig {
    pub(crate) pipeline: PipelineConfig,
    pub(crate) assembler: AssemblerChain,
}

/// Load file config and merge CLI overrides.
/// Single entry point that returns a resolved config bundle.
pub(crate) fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    let file = load_file_config(args.config.as_deref())?;
    let pipeline = resolve_pipeline_config(args, file.as_ref())?;
    let assembler = build_assembler(args, file.as_ref(), &pipeline.output_dir);
    Ok(ResolvedConfig {
        pipeline,
        assembler,
    })
}

/// Precedence per field: CLI flag, then config file, then preset.
pub(crate) fn resolve_pipeline_config(
    args: &Args,
    file: Option<&FileConfig>,
) -> Result<PipelineConfig> {
    let empty = FileConfig::default();
    let file = file.unwrap_or(&empty);

    let preset = args
        .preset
        .or(file.preset)
        .unwrap_or(Preset::AirfieldsWithInfo);
    let mut config = PipelineConfig::from_preset(preset);

    if let Some(dir) = args.output_dir.as_ref().or(file.output_dir.as_ref()) {
        config.output_dir.clone_from(dir);
    }
    if let Some(url) = args.base_url.as_ref().or(file.base_url.as_ref()) {
        config.base_url.clone_from(url);
    }
    if let Some(page) = args.index_page.as_ref().or(file.index_page.as_ref()) {
        config.index_page_id.clone_from(page);
    }
    if let Some(url) = args.print_url.as_ref().or(file.print_url.as_ref()) {
        config.print_url_base.clone_from(url);
    }
    if let Some(policy) = args.info_docs.or(file.info_docs) {
        config.info_doc_policy = policy;
    }

    if let Some(skip) = file.skip_sections {
        config.section_selection = SectionSelection::SkipPrefix(skip);
    }
    if let Some(sections) = &file.sections {
        config.section_selection = sections.clone();
    }
    if let Some(mode) = file.output_mode {
        config.output_mode = mode;
    }
    if let Some(prefix) = &file.info_prefix {
        config.info_prefix.clone_from(prefix);
    }
    if let Some(separator) = &file.name_separator {
        config.name_separator.clone_from(separator);
    }
    if let Some(suffix) = &file.info_suffix {
        config.info_suffix.clone_from(suffix);
    }
    if let Some(subdir) = &file.document_subdir {
        config.per_document_subdir.clone_from(subdir);
    }
    if let Some(name) = &file.append_file {
        config.append_file_name.clone_from(name);
    }

    if let Some(concurrency) = args.concurrency.or(file.concurrency) {
        config.concurrency = usize::from(concurrency);
    }
    if let Some(secs) = args.timeout.or(file.timeout_secs) {
        config.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = args.max_retries.or(file.max_retries) {
        config.max_attempts = u32::from(retries) + 1;
    }
    if let Some(secs) = file.connect_timeout_secs {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.read_timeout_secs {
        config.read_timeout = Duration::from_secs(secs);
    }

    config
        .validate()
        .context("Resolved configuration is invalid")?;
    Ok(config)
}

/// Assembly steps for the finalizing phase: manifest copy first, then the archive.
pub(crate) fn build_assembler(
    args: &Args,
    file: Option<&FileConfig>,
    output_dir: &Path,
) -> AssemblerChain {
    let mut chain = AssemblerChain::new();

    let manifest = args
        .manifest
        .as_ref()
        .or_else(|| file.and_then(|f| f.manifest.as_ref()));
    if let Some(manifest) = manifest {
        chain = chain.then(ManifestCopy::new(manifest.clone()));
    }

    match &args.archive {
        Some(Some(destination)) => chain = chain.then(ZipArchive::new(destination.clone())),
        Some(None) => chain = chain.then(ZipArchive::beside(output_dir)),
        None if file.and_then(|f| f.archive).unwrap_or(false) => {
            chain = chain.then(ZipArchive::beside(output_dir));
        }
        None => {}
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartfetch_core::{InfoDocPolicy, OutputMode};
    use clap::Parser;
    use std::path::PathBuf;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["chartfetch"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults_to_airfields_with_info_preset() {
        let config = resolve_pipeline_config(&args(&[]), None).unwrap();
        assert_eq!(config, PipelineConfig::from_preset(Preset::AirfieldsWithInfo));
    }

    #[test]
    fn test_cli_overrides_file_overrides_preset() {
        let file = FileConfig {
            preset: Some(Preset::Aip),
            concurrency: Some(4),
            output_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let config =
            resolve_pipeline_config(&args(&["-o", "/from/cli"]), Some(&file)).unwrap();

        assert_eq!(config.output_mode, OutputMode::AppendedSinglePdf);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.output_dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_cli_preset_beats_file_preset() {
        let file = FileConfig {
            preset: Some(Preset::Aip),
            ..FileConfig::default()
        };
        let config = resolve_pipeline_config(&args(&["-p", "ad"]), Some(&file)).unwrap();
        assert_eq!(config.info_doc_policy, InfoDocPolicy::Skip);
        assert_eq!(config.output_mode, OutputMode::PerDocumentFile);
    }

    #[test]
    fn test_retries_become_attempts() {
        let config = resolve_pipeline_config(&args(&["-r", "0", "-t", "15"]), None).unwrap();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let file = FileConfig {
            name_separator: Some(String::new()),
            ..FileConfig::default()
        };
        assert!(resolve_pipeline_config(&args(&[]), Some(&file)).is_err());
    }

    #[test]
    fn test_assembler_chain_from_flags() {
        let root = Path::new("/tmp/out");
        assert!(build_assembler(&args(&[]), None, root).is_empty());
        assert!(!build_assembler(&args(&["--archive"]), None, root).is_empty());
        assert!(!build_assembler(&args(&["--manifest", "m.json"]), None, root).is_empty());

        let file = FileConfig {
            archive: Some(true),
            ..FileConfig::default()
        };
        assert!(!build_assembler(&args(&[]), Some(&file), root).is_empty());
    }
}
