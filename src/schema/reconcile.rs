//! Header normalisation and reconciliation of a table against its canonical
//! schema. Every function returns a new batch; inputs are never modified.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{bail, Context, Result};
use arrow::{
    array::{new_null_array, Array, ArrayRef, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use serde::Serialize;

use super::canonical::RecordType;

/// Sentinel written into every null or empty cell of a reconciled table.
pub const UNKNOWN: &str = "unknown";

pub const POLICING_OPERATION: &str = "Policing operation";

const POLICING_SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchRecord {
    pub dataset: String,
    pub missing_cols: Vec<String>,
    pub extra_cols: Vec<String>,
}

/// A table aligned to its canonical schema, plus how it deviated.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub record_type: RecordType,
    pub table: RecordBatch,
    pub mismatch: Option<MismatchRecord>,
}

pub fn column_names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

/// Strip leading/trailing whitespace from every column name.
pub fn strip_column_names(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(f.name().trim()))
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), batch.columns().to_vec())
        .context("renaming columns")
}

/// Names that occur more than once in `schema`, sorted, each listed once.
///
/// Stripping can make distinct headers collide (`Gender` and `Gender `), and
/// a collided table cannot be reindexed without losing one of the columns.
pub fn duplicate_columns(schema: &Schema) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for field in schema.fields() {
        if !seen.insert(field.name().as_str()) {
            dups.insert(field.name().clone());
        }
    }
    dups.into_iter().collect()
}

/// Render a row as `column=value` pairs; nulls render empty.
fn render_row(batch: &RecordBatch, row: usize) -> Result<String> {
    let schema = batch.schema();
    let mut cells = Vec::with_capacity(batch.num_columns());
    for (col, field) in batch.columns().iter().zip(schema.fields()) {
        let value = if col.is_valid(row) {
            array_value_to_string(col.as_ref(), row)?
        } else {
            String::new()
        };
        cells.push(format!("{}={}", field.name(), value));
    }
    Ok(cells.join(", "))
}

/// Drop the "Policing operation" column if present.
///
/// Returns the table without it and, when the column existed, up to three
/// rendered rows whose policing operation was non-empty (first rows first).
pub fn drop_policing_operation(
    batch: &RecordBatch,
) -> Result<(RecordBatch, Option<Vec<String>>)> {
    let Ok(idx) = batch.schema().index_of(POLICING_OPERATION) else {
        return Ok((batch.clone(), None));
    };

    let col = cast(batch.column(idx).as_ref(), &DataType::Utf8)?;
    let values = col
        .as_any()
        .downcast_ref::<StringArray>()
        .context("policing operation column is not text")?;

    let mut samples = Vec::new();
    for row in 0..values.len() {
        if samples.len() == POLICING_SAMPLE_ROWS {
            break;
        }
        if values.is_valid(row) && !values.value(row).is_empty() {
            samples.push(render_row(batch, row)?);
        }
    }

    let keep: Vec<usize> = (0..batch.num_columns()).filter(|&i| i != idx).collect();
    let projected = batch.project(&keep).context("dropping policing operation")?;
    Ok((projected, Some(samples)))
}

/// Compare present columns against the canonical set of `record_type`.
pub fn find_mismatch(
    dataset: &str,
    record_type: RecordType,
    schema: &Schema,
) -> Option<MismatchRecord> {
    let canonical = record_type.canonical_set();
    let present: BTreeSet<String> = column_names(schema).into_iter().collect();

    let missing_cols: Vec<String> = canonical
        .iter()
        .filter(|c| !present.contains(**c))
        .map(|c| c.to_string())
        .collect();
    let extra_cols: Vec<String> = present
        .iter()
        .filter(|c| !canonical.contains(c.as_str()))
        .cloned()
        .collect();

    if missing_cols.is_empty() && extra_cols.is_empty() {
        None
    } else {
        Some(MismatchRecord {
            dataset: dataset.to_string(),
            missing_cols,
            extra_cols,
        })
    }
}

/// Sorted union of the canonical columns and the columns of `schema`.
pub fn target_columns(record_type: RecordType, schema: &Schema) -> Vec<String> {
    let mut all: BTreeSet<String> = column_names(schema).into_iter().collect();
    all.extend(record_type.canonical_columns().iter().map(|c| c.to_string()));
    all.into_iter().collect()
}

/// Lay `batch` out as exactly `columns`, in that order, all utf8. Columns the
/// batch lacks come back all-null.
pub fn reindex(batch: &RecordBatch, columns: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for name in columns {
        let array = match schema.index_of(name) {
            Ok(i) => cast(batch.column(i).as_ref(), &DataType::Utf8)
                .with_context(|| format!("rendering column `{}` as text", name))?,
            Err(_) => new_null_array(&DataType::Utf8, batch.num_rows()),
        };
        fields.push(Field::new(name, DataType::Utf8, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("reindexing table")
}

/// Replace every null or empty cell with [`UNKNOWN`].
pub fn fill_unknown(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    let mut fields = Vec::with_capacity(batch.num_columns());
    let schema = batch.schema();

    for (col, field) in batch.columns().iter().zip(schema.fields()) {
        let text = cast(col.as_ref(), &DataType::Utf8)?;
        let values = text
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected a text column")?;
        let filled: StringArray = values
            .iter()
            .map(|v| match v {
                Some(s) if !s.is_empty() => Some(s),
                _ => Some(UNKNOWN),
            })
            .collect();
        fields.push(Field::new(field.name(), DataType::Utf8, true));
        arrays.push(Arc::new(filled));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("filling unknowns")
}

/// Align a classified table to its canonical schema.
pub fn reconcile(
    dataset: &str,
    record_type: RecordType,
    batch: &RecordBatch,
) -> Result<Reconciled> {
    let schema = batch.schema();
    let duplicates = duplicate_columns(&schema);
    if !duplicates.is_empty() {
        bail!("{} has duplicate columns {:?}", dataset, duplicates);
    }

    let mismatch = find_mismatch(dataset, record_type, &schema);
    let columns = target_columns(record_type, &schema);
    let table = fill_unknown(&reindex(batch, &columns)?)?;

    Ok(Reconciled {
        record_type,
        table,
        mismatch,
    })
}
