//! Concatenation of reconciled tables into one unified table per record type.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use arrow::{
    array::{Array, StringArray},
    compute::concat_batches,
    datatypes::Schema,
    record_batch::RecordBatch,
};
use tracing::{info, warn};

use crate::schema::{
    fill_unknown, reconcile::column_names, reindex, MismatchRecord, Reconciled, RecordType,
};

#[derive(Debug, Default)]
struct Pending {
    tables: Vec<RecordBatch>,
    mismatches: Vec<MismatchRecord>,
}

/// Collects reconciled tables in input order until [`Aggregator::finish`].
#[derive(Debug, Default)]
pub struct Aggregator {
    crime: Pending,
    stop_and_search: Pending,
}

#[derive(Debug)]
pub struct UnifiedTable {
    pub record_type: RecordType,
    pub table: RecordBatch,
    /// Number of source tables concatenated into `table`.
    pub sources: usize,
    pub mismatches: Vec<MismatchRecord>,
}

impl UnifiedTable {
    pub fn is_empty(&self) -> bool {
        self.sources == 0
    }
}

#[derive(Debug)]
pub struct UnifiedTables {
    pub crime: UnifiedTable,
    pub stop_and_search: UnifiedTable,
}

impl UnifiedTables {
    pub fn get(&self, record_type: RecordType) -> &UnifiedTable {
        match record_type {
            RecordType::Crime => &self.crime,
            RecordType::StopAndSearch => &self.stop_and_search,
        }
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending_mut(&mut self, record_type: RecordType) -> &mut Pending {
        match record_type {
            RecordType::Crime => &mut self.crime,
            RecordType::StopAndSearch => &mut self.stop_and_search,
        }
    }

    pub fn push(&mut self, reconciled: Reconciled) {
        let pending = self.pending_mut(reconciled.record_type);
        pending.tables.push(reconciled.table);
        pending.mismatches.extend(reconciled.mismatch);
    }

    pub fn finish(self) -> Result<UnifiedTables> {
        Ok(UnifiedTables {
            crime: finish_one(RecordType::Crime, self.crime)?,
            stop_and_search: finish_one(RecordType::StopAndSearch, self.stop_and_search)?,
        })
    }
}

fn finish_one(record_type: RecordType, pending: Pending) -> Result<UnifiedTable> {
    let table = unify(&pending.tables)
        .with_context(|| format!("concatenating {} tables", record_type))?;

    if pending.tables.is_empty() {
        warn!("no {} datasets were found", record_type);
    } else {
        info!(
            sources = pending.tables.len(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "unified {} table",
            record_type
        );
    }

    Ok(UnifiedTable {
        record_type,
        table,
        sources: pending.tables.len(),
        mismatches: pending.mismatches,
    })
}

/// Align every table to the sorted superset of their columns, fill the gaps
/// with the unknown sentinel and concatenate in order. No tables yields an
/// empty batch with no columns.
pub fn unify(tables: &[RecordBatch]) -> Result<RecordBatch> {
    if tables.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let superset: Vec<String> = tables
        .iter()
        .flat_map(|t| column_names(&t.schema()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let aligned = tables
        .iter()
        .map(|t| fill_unknown(&reindex(t, &superset)?))
        .collect::<Result<Vec<_>>>()?;

    let schema = aligned[0].schema();
    concat_batches(&schema, &aligned).context("concatenating batches")
}

/// Null or empty cells per column, in column order.
pub fn missing_counts(batch: &RecordBatch) -> Vec<(String, usize)> {
    let schema = batch.schema();
    batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(col, field)| {
            let empties = col
                .as_any()
                .downcast_ref::<StringArray>()
                .map_or(0, |s| s.iter().flatten().filter(|v| v.is_empty()).count());
            (field.name().clone(), col.null_count() + empties)
        })
        .collect()
}
