//! Merges command line arguments with configuration file defaults.

use std::time::Duration;

use anyhow::{Result, bail};
use bibliophile_core::catalog::{HttpTimeouts, MatchOptions};
use bibliophile_core::config::{FileConfig, VerbositySetting};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::cli::Args;

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) shelf: bool,
    pub(crate) biblio: bool,
    pub(crate) branch: bool,
    pub(crate) language: bool,
    pub(crate) concurrency: bool,
    pub(crate) timeout: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let sources = CliValueSources {
        shelf: is_commandline_value(&matches, "shelf"),
        biblio: is_commandline_value(&matches, "biblio"),
        branch: is_commandline_value(&matches, "branch"),
        language: is_commandline_value(&matches, "language"),
        concurrency: is_commandline_value(&matches, "concurrency"),
        timeout: is_commandline_value(&matches, "timeout"),
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
    };
    (args, sources)
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every argument not given on the command line from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.shelf
            && let Some(shelf) = &file_config.shelf
        {
            args.shelf.clone_from(shelf);
        }
        if !cli_sources.biblio
            && let Some(biblio) = &file_config.biblio
        {
            args.biblio.clone_from(biblio);
        }
        if !cli_sources.branch
            && let Some(branch) = &file_config.branch
        {
            args.branch.clone_from(branch);
        }
        if !cli_sources.language
            && let Some(language) = &file_config.language
        {
            args.language.clone_from(language);
        }
        if !cli_sources.concurrency
            && let Some(concurrency) = file_config.concurrency
        {
            args.concurrency = Some(concurrency);
        }
        if !cli_sources.timeout
            && let Some(timeout) = file_config.request_timeout_secs
        {
            args.timeout = timeout;
        }
        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if let Some(concurrency) = args.concurrency
        && !(1..=100).contains(&concurrency)
    {
        bail!("Invalid effective concurrency value: {concurrency}. Expected range: 1..=100");
    }
    if args.biblio.trim().is_empty() {
        bail!("Invalid effective biblio value: must not be empty");
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (quiet, verbose) = match verbosity {
        VerbositySetting::Default => (false, 0),
        VerbositySetting::Verbose => (false, 1),
        VerbositySetting::Quiet => (true, 0),
        VerbositySetting::Debug => (false, 2),
    };
    args.quiet = quiet;
    args.verbose = verbose;
}

pub(crate) fn resolve_http_timeouts(args: &Args, file_config: Option<&FileConfig>) -> HttpTimeouts {
    let mut timeouts = HttpTimeouts {
        read_secs: args.timeout,
        ..HttpTimeouts::default()
    };
    if let Some(connect_secs) = file_config.and_then(|config| config.connect_timeout_secs) {
        timeouts.connect_secs = connect_secs;
    }
    timeouts
}

pub(crate) fn match_options(args: &Args) -> MatchOptions {
    MatchOptions {
        branch: (!args.any_branch).then(|| args.branch.clone()),
        language: Some(args.language.clone()).filter(|language| !language.trim().is_empty()),
        max_in_flight: args.concurrency.map(usize::from),
        request_timeout: Duration::from_secs(args.timeout),
    }
}

/// Priority below `RUST_LOG`: quiet, then verbose count, then info.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
