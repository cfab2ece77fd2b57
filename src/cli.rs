//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use chartfetch_core::{InfoDocPolicy, Preset};

/// Mirror a VFR chart catalog into page-image PDFs.
///
/// Crawls the catalog index, its sections and leaf-groups, and converts each
/// document's embedded chart image into a PDF, either one file per document
/// or one appended multi-page document.
#[derive(Parser, Debug)]
#[command(name = "chartfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Catalog preset: ad, ad-info or aip [default: ad-info]
    #[arg(short, long, value_parser = parse_preset)]
    pub preset: Option<Preset>,

    /// Config file (default: $XDG_CONFIG_HOME/chartfetch/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Catalog base URL that relative links resolve against
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Index page, relative to the base URL
    #[arg(long, value_name = "PAGE")]
    pub index_page: Option<String>,

    /// Print-view base URL document links are re-rooted onto
    #[arg(long, value_name = "URL")]
    pub print_url: Option<String>,

    /// What to do with info documents: skip or rename
    #[arg(long, value_name = "POLICY", value_parser = parse_info_docs)]
    pub info_docs: Option<InfoDocPolicy>,

    /// Maximum concurrent document fetches (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Deadline for one page fetch in seconds (1-3600)
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Maximum retry attempts for transient failures (0-9)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub max_retries: Option<u8>,

    /// Manifest file copied verbatim into the output root
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Package the output root into a zip archive (default: charts.zip next to it)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub archive: Option<Option<PathBuf>>,

    /// Where to write the JSON run summary (default: summary.json next to the output root)
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,
}

fn parse_preset(value: &str) -> Result<Preset, String> {
    value.parse::<Preset>().map_err(|e| e.to_string())
}

fn parse_info_docs(value: &str) -> Result<InfoDocPolicy, String> {
    value.parse::<InfoDocPolicy>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["chartfetch"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.preset.is_none());
        assert!(args.concurrency.is_none());
        assert!(args.archive.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["chartfetch", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["chartfetch", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["chartfetch", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["chartfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["chartfetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["chartfetch", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_preset_parsed() {
        let args = Args::try_parse_from(["chartfetch", "--preset", "aip"]).unwrap();
        assert_eq!(args.preset, Some(Preset::Aip));

        let err = Args::try_parse_from(["chartfetch", "-p", "gen"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_concurrency_range() {
        let args = Args::try_parse_from(["chartfetch", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, Some(100));

        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["chartfetch", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_max_retries_range() {
        let args = Args::try_parse_from(["chartfetch", "-r", "0"]).unwrap();
        assert_eq!(args.max_retries, Some(0));

        let err = Args::try_parse_from(["chartfetch", "-r", "10"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_archive_optional_value() {
        let args = Args::try_parse_from(["chartfetch", "--archive"]).unwrap();
        assert_eq!(args.archive, Some(None));

        let args = Args::try_parse_from(["chartfetch", "--archive", "out/charts.zip"]).unwrap();
        assert_eq!(args.archive, Some(Some(PathBuf::from("out/charts.zip"))));
    }

    #[test]
    fn test_cli_info_docs_policy() {
        let args = Args::try_parse_from(["chartfetch", "--info-docs", "rename"]).unwrap();
        assert_eq!(args.info_docs, Some(InfoDocPolicy::RenameUsingLeafId));
        assert!(Args::try_parse_from(["chartfetch", "--info-docs", "keep"]).is_err());
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = Args::try_parse_from([
            "chartfetch",
            "-p",
            "ad",
            "-o",
            "mirror",
            "-c",
            "4",
            "-t",
            "30",
            "--manifest",
            "manifest.json",
        ])
        .unwrap();
        assert_eq!(args.preset, Some(Preset::Airfields));
        assert_eq!(args.output_dir, Some(PathBuf::from("mirror")));
        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.timeout, Some(30));
        assert_eq!(args.manifest, Some(PathBuf::from("manifest.json")));
    }
}
