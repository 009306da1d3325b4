//! One run: load → describe/profile → normalise → classify/reconcile →
//! aggregate → report → export. All state lives in locals of [`run`].

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info, warn};

use crate::{
    aggregate::{Aggregator, UnifiedTables},
    config::Config,
    export::export,
    load::{self, LoadOutcome},
    profile::{describe, profile_table},
    report,
    schema::{
        classify, drop_policing_operation, duplicate_columns, reconcile,
        reconcile::column_names, strip_column_names, POLICING_OPERATION,
    },
};

#[derive(Debug)]
pub struct RunSummary {
    pub loaded: usize,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    /// Identifiers of datasets that matched no record type.
    pub unclassified: Vec<String>,
    /// Identifiers of datasets skipped because stripped headers collided.
    pub rejected: Vec<String>,
    pub unified: UnifiedTables,
    pub exported: Vec<PathBuf>,
}

fn profile_datasets<W: Write>(out: &mut W, outcome: &LoadOutcome) -> Result<()> {
    for bucket in &outcome.buckets {
        writeln!(out, "Description for {}:\n", bucket.key)?;
        for dataset in &bucket.datasets {
            let summaries = describe(&dataset.table)
                .with_context(|| format!("describing {}", dataset.id()))?;
            report::write_description(out, &bucket.key, dataset.index, &summaries)?;
        }
    }

    for bucket in &outcome.buckets {
        report::write_bucket_banner(out, "Analysis for", &bucket.key)?;
        for dataset in &bucket.datasets {
            let profiles = profile_table(&dataset.table)
                .with_context(|| format!("profiling {}", dataset.id()))?;
            report::write_profile(out, dataset.index, dataset.table.num_rows(), &profiles)?;
        }
    }

    writeln!(out, "\nAnalysis complete!")?;
    Ok(())
}

/// Drop the policing-operation column from a header-stripped table, logging
/// what it held.
fn drop_policing_column(id: &str, stripped: &RecordBatch) -> Result<RecordBatch> {
    let (table, samples) = drop_policing_operation(stripped)?;

    match samples {
        None => debug!(
            dataset = %id,
            columns = ?column_names(&stripped.schema()),
            "column '{}' not found",
            POLICING_OPERATION
        ),
        Some(samples) => {
            if samples.is_empty() {
                info!(dataset = %id, "no valid policing operation records found");
            }
            for row in &samples {
                info!(dataset = %id, "policing operation sample: {}", row);
            }
            info!(dataset = %id, "dropped '{}'", POLICING_OPERATION);
        }
    }

    Ok(table)
}

pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<RunSummary> {
    let buckets = load::discover(&config.data_dir, &config.extension)?;
    info!(
        root = %config.data_dir.display(),
        buckets = buckets.len(),
        "discovered time buckets"
    );

    let mut outcome = load::load(buckets);
    report::write_load_summary(out, &outcome)?;

    if !config.skip_profile {
        profile_datasets(out, &outcome)?;
    }

    let loaded = outcome.loaded_count();
    let missing = std::mem::take(&mut outcome.missing);
    let failed: Vec<PathBuf> = outcome.failures.iter().map(|f| f.path.clone()).collect();

    let mut aggregator = Aggregator::new();
    let mut unclassified = Vec::new();
    let mut rejected = Vec::new();

    for dataset in outcome.into_datasets() {
        let id = dataset.id();
        let stripped = strip_column_names(&dataset.raw)?;

        let duplicates = duplicate_columns(&stripped.schema());
        if !duplicates.is_empty() {
            warn!(
                dataset = %id,
                path = %dataset.path.display(),
                ?duplicates,
                "duplicate columns after stripping names, skipping"
            );
            report::write_rejected(out, &id, &duplicates)?;
            rejected.push(id);
            continue;
        }

        let table = drop_policing_column(&id, &stripped)?;

        match classify(&table.schema()) {
            Some(record_type) => {
                let reconciled = reconcile(&id, record_type, &table)
                    .with_context(|| format!("reconciling {}", id))?;
                debug!(dataset = %id, "classified as {}", record_type);
                aggregator.push(reconciled);
            }
            None => {
                warn!(
                    dataset = %id,
                    columns = ?column_names(&table.schema()),
                    "could not classify"
                );
                unclassified.push(id);
            }
        }
    }

    let unified = aggregator.finish()?;
    report::write_unified_summary(out, &unified)?;

    let exported = match &config.export_dir {
        Some(dir) => export(dir, config.export_format, &unified)?,
        None => Vec::new(),
    };

    Ok(RunSummary {
        loaded,
        missing,
        failed,
        unclassified,
        rejected,
        unified,
        exported,
    })
}
