//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

pub(crate) const DEFAULT_SHELF: &str = "to-read";
pub(crate) const DEFAULT_BIBLIO: &str = "sfpl";
pub(crate) const DEFAULT_BRANCH: &str = "*MAIN";
pub(crate) const DEFAULT_LANGUAGE: &str = "eng";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Find the books on your Goodreads shelf at your local library.
///
/// Reads a Goodreads "Export Library" CSV, searches a BiblioCommons catalog
/// for every book on the shelf, and prints each match with its call number.
#[derive(Parser, Debug, Clone)]
#[command(name = "bibliophile")]
#[command(author, version, about)]
pub struct Args {
    /// Goodreads library export (CSV)
    #[arg(value_name = "EXPORT")]
    pub export: PathBuf,

    /// Goodreads shelf to look up
    #[arg(long, default_value = DEFAULT_SHELF)]
    pub shelf: String,

    /// BiblioCommons subdomain of the library system (e.g. sfpl, seattle)
    #[arg(long, default_value = DEFAULT_BIBLIO)]
    pub biblio: String,

    /// Only report books available at this branch, spelled as the catalog lists it
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Search every branch instead of one
    #[arg(long, conflicts_with = "branch")]
    pub any_branch: bool,

    /// ISO 639-2 language code of editions to match
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Also write the matches to this CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Cap concurrent catalog requests (1-100); by default every request is sent at once
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Configuration file (default: $XDG_CONFIG_HOME/bibliophile/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["bibliophile", "export.csv"]).unwrap();
        assert_eq!(args.export, PathBuf::from("export.csv"));
        assert_eq!(args.shelf, "to-read");
        assert_eq!(args.biblio, "sfpl");
        assert_eq!(args.branch, "*MAIN");
        assert!(!args.any_branch);
        assert_eq!(args.language, "eng");
        assert_eq!(args.concurrency, None);
        assert_eq!(args.timeout, 30);
        assert!(args.csv.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_export_is_required() {
        let err = Args::try_parse_from(["bibliophile"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["bibliophile", "e.csv", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_library_options() {
        let args = Args::try_parse_from([
            "bibliophile",
            "e.csv",
            "--biblio",
            "seattle",
            "--branch",
            "Fremont Branch",
            "--shelf",
            "wishlist",
            "--language",
            "spa",
            "--csv",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(args.biblio, "seattle");
        assert_eq!(args.branch, "Fremont Branch");
        assert_eq!(args.shelf, "wishlist");
        assert_eq!(args.language, "spa");
        assert_eq!(args.csv, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_cli_any_branch_conflicts_with_explicit_branch() {
        let args = Args::try_parse_from(["bibliophile", "e.csv", "--any-branch"]).unwrap();
        assert!(args.any_branch);

        let err = Args::try_parse_from(["bibliophile", "e.csv", "--any-branch", "--branch", "X"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_concurrency_range() {
        let args = Args::try_parse_from(["bibliophile", "e.csv", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, Some(100));

        for value in ["0", "101"] {
            let err = Args::try_parse_from(["bibliophile", "e.csv", "-c", value]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let err = Args::try_parse_from(["bibliophile", "e.csv", "--timeout", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["bibliophile", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
