//! newsflow_china — coleta de notícias sobre a China e resumo diário.
//!
//! A run walks the three fixed outlets, persists whatever each index page
//! yields, fills in the missing Portuguese translations and rewrites the
//! HTML digest for the trailing window. A source that fails to respond is
//! logged and skipped; only storage and digest errors abort the run.

mod backup;
mod cli;
mod models;
mod outputs;
mod scrapers;
mod store;
mod translate;
mod utils;

use std::error::Error;
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt::time::UtcTime};

use crate::cli::{Cli, Command};
use crate::outputs::digest;
use crate::scrapers::Outlet;
use crate::store::Store;
use crate::translate::GoogleTranslator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();

    let cli = Cli::parse();
    let store = Store::open(&cli.db_path).await?;

    match cli.command {
        Some(Command::List { source, limit, json }) => list(&store, source.as_deref(), limit, json).await,
        Some(Command::Export) => export(&store, &cli).await,
        None => run(&store, &cli).await,
    }
}

/// The full pipeline: collect, persist, translate, render.
async fn run(store: &Store, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let started = Instant::now();
    let ran_at = Utc::now();

    let mut upserted = 0usize;
    let mut sources_ok = 0usize;
    let mut sources_failed = 0usize;

    for outlet in Outlet::ALL {
        info!(source = outlet.id(), "Collecting {}", outlet.display_name());
        match outlet.collect().await {
            Ok(stubs) => {
                let count = store
                    .upsert_batch(outlet.id(), outlet.language(), Utc::now(), &stubs)
                    .await?;
                info!(source = outlet.id(), count, "Source collected");
                upserted += count;
                sources_ok += 1;
            }
            Err(e) => {
                warn!(source = outlet.id(), error = %e, "Source failed, continuing");
                sources_failed += 1;
            }
        }
    }

    if cli.no_translate {
        info!("Translation pass skipped");
    } else {
        translate::translate_missing(store, &GoogleTranslator::new()).await?;
    }

    store
        .record_run(ran_at, upserted, sources_ok, sources_failed)
        .await?;

    let html = digest::build_digest(store, Utc::now(), cli.hours).await?;
    digest::write_digest(&cli.output, &html).await?;

    if cli.git_push && !backup::git_backup(".").await {
        error!("Git backup did not complete");
    }

    info!(
        upserted,
        sources_ok,
        sources_failed,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Run complete"
    );
    Ok(())
}

/// Print recently collected rows, newest publication first.
async fn list(
    store: &Store,
    source: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    if let Some(id) = source {
        if Outlet::from_id(id).is_none() {
            return Err(format!("unknown source id: {id}").into());
        }
    }

    let rows = store.list_recent(source, limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let when = row
            .published_at
            .map(crate::utils::fmt_brasilia)
            .unwrap_or_else(|| "sem data".to_string());
        println!("[{}] {} — {}", row.source, when, row.display_title());
        println!("    {}", row.url);
    }
    info!(count = rows.len(), "Listed articles");
    Ok(())
}

/// Re-render the digest from the store without touching the network.
async fn export(store: &Store, cli: &Cli) -> Result<(), Box<dyn Error>> {
    if !cli.no_translate {
        translate::translate_missing(store, &GoogleTranslator::new()).await?;
    }
    let html = digest::build_digest(store, Utc::now(), cli.hours).await?;
    digest::write_digest(&cli.output, &html).await?;
    Ok(())
}
