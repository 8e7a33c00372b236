//! stampfile - Inspect and record last-updated sidecars
//!
//! A small command-line tool around the timestamp cache, useful for checking
//! how stale a local mirror is or for seeding a sidecar by hand.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stampfile::cli::{Cli, Command, ShowReport};
use stampfile::store::PropertiesFileStore;
use stampfile::{PropertyStore, TimestampCache};

/// Installs a stderr subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Show {
            artifact,
            fallback_file,
            fallback_key,
            json,
        } => {
            let cache = TimestampCache::new(cli.artifact_path(artifact)?);
            let store = fallback_file.as_ref().map(PropertiesFileStore::new);

            let resolved = cache.resolve_detailed(
                store.as_ref().map(|s| s as &dyn PropertyStore),
                fallback_key.as_deref(),
            );
            let report = ShowReport::new(cache.artifact().to_path_buf(), cache.sidecar_path(), resolved);

            if *json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.to_text());
            }
        }
        Command::Record { artifact, at } => {
            let cache = TimestampCache::new(cli.artifact_path(artifact)?);
            match at {
                Some(timestamp) => cache.record(*timestamp)?,
                None => cache.record_now()?,
            }
            tracing::info!(sidecar = %cache.sidecar_path().display(), "recorded last-updated timestamp");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
