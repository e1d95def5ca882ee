//! CLI entry point for bibliophile.

use std::sync::Arc;

use anyhow::{Context, Result};
use bibliophile_core::config::{load_default_file_config, load_explicit_file_config};
use bibliophile_core::report::{match_line, summary_line, write_csv_file};
use bibliophile_core::{
    BiblioCommonsApi, CatalogMatcher, ShelfExport, TracingDiagnostics, WishlistSource,
};
use tracing::{debug, info, warn};

mod cli;
mod runtime;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, cli_sources) = runtime::parse_cli_with_sources();

    let loaded = match args.config.as_deref() {
        Some(path) => load_explicit_file_config(path)?,
        None => load_default_file_config()?,
    };
    let args = runtime::apply_config_defaults(args, &cli_sources, loaded.config.as_ref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = runtime::resolve_default_log_level(&args);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        ?args,
        config_path = ?loaded.path,
        config_loaded = loaded.loaded_from_file(),
        "CLI arguments resolved"
    );

    let export = ShelfExport::from_path(&args.export, &args.shelf);
    let books = export
        .wanted_books()
        .with_context(|| format!("Failed to read shelf '{}'", export.shelf()))?;
    info!(shelf = %export.shelf(), "{} books found on shelf", books.len());
    if books.is_empty() {
        return Ok(());
    }

    let timeouts = runtime::resolve_http_timeouts(&args, loaded.config.as_ref());
    let api = BiblioCommonsApi::new(&args.biblio, timeouts)?;
    let options = runtime::match_options(&args);
    info!(
        "Searching library catalog for books at {}",
        options.branch.as_deref().unwrap_or("any branch")
    );

    let matcher = CatalogMatcher::new(Arc::new(api), Arc::new(TracingDiagnostics), options);
    let report = matcher.run(&books).await;

    for record in &report.records {
        println!("{}", match_line(record));
    }

    if let Some(path) = &args.csv {
        write_csv_file(path, &report.records)?;
        info!(path = %path.display(), records = report.records.len(), "Wrote CSV report");
    }

    if report.saw_unstable_api() {
        warn!(
            "The catalog's undocumented API appears to have changed; some call numbers were skipped. Update bibliophile."
        );
    }

    println!("{}", summary_line(&report));
    Ok(())
}
