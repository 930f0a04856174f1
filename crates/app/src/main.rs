use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::EnvFilter;

use rinse_clean::FieldCleaner;
use rinse_sync::SyncEngine;

mod config;
mod source;
mod submit;

use config::Config;
use source::{JsonFileSource, NoPriorImports};
use submit::LogSubmitter;

struct Args {
    config: PathBuf,
    dry_run: bool,
}

const USAGE: &str = "usage: rinse [-c|--config <path>] [-n|--dry-run]";

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: PathBuf::from("rinse.toml"),
        dry_run: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-n" | "--dry-run" => parsed.dry_run = true,
            "-c" | "--config" => {
                parsed.config = args
                    .next()
                    .map(PathBuf::from)
                    .with_context(|| format!("{arg} needs a path\n{USAGE}"))?;
            }
            other => anyhow::bail!("unknown argument {other:?}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let cleaner = FieldCleaner::compile(
        &config.pre_replacements,
        &config.replacements,
        &config.finalizer,
        config.sync.verbose,
    )
    .context("compiling cleaning rules")?;

    let engine = SyncEngine::new(
        Arc::new(JsonFileSource::new(&config.sync.source_dir)),
        Arc::new(NoPriorImports),
        Arc::new(LogSubmitter::new(args.dry_run)),
        Arc::new(cleaner),
        config.sync.concurrency,
    );

    let today = Local::now().date_naive();
    let window = config.window(today);
    tracing::info!(
        "syncing {} accounts over {window}{}",
        config.accounts.len(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    let report = engine.run(&config.accounts, window, today).await;
    for account in &report.accounts {
        tracing::info!(
            "{}: fetched {}, submitted {}, skipped {} existing / {} future / {} invalid",
            account.account,
            account.fetched,
            account.submitted,
            account.skipped_existing,
            account.skipped_future,
            account.skipped_invalid,
        );
    }

    if report.failures() > 0 {
        anyhow::bail!("{} of {} accounts failed", report.failures(), report.accounts.len());
    }
    Ok(())
}
