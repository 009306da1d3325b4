use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use police_ingest::{run, Config};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let config = Config::parse();
    info!(?config, "startup");

    // ─── 3) run ──────────────────────────────────────────────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = run(&config, &mut out)?;
    out.flush()?;

    info!(
        loaded = summary.loaded,
        missing = summary.missing.len(),
        failed = summary.failed.len(),
        unclassified = summary.unclassified.len(),
        rejected = summary.rejected.len(),
        crime_rows = summary.unified.crime.table.num_rows(),
        stop_and_search_rows = summary.unified.stop_and_search.table.num_rows(),
        exported = summary.exported.len(),
        "all done"
    );
    Ok(())
}
