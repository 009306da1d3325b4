//! Column type derivation for CSV tables that were read as all-text.
//!
//! Every non-empty cell of a column is classified on its own; the column keeps
//! a type only when all of its cells agree (integers widen to floats). Any
//! other disagreement, or a column with no samples, stays utf8.

use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, Float64Builder, Int64Builder, StringArray, TimestampMillisecondBuilder,
    },
    datatypes::{DataType, Field, Schema, TimeUnit},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::utils::clean_str;

/// Timezone attached to every parsed timestamp column.
pub const TIMESTAMP_TZ: &str = "+00:00";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Integer,
    Float,
    Timestamp,
    Text,
}

impl CellKind {
    fn widen(self, other: CellKind) -> CellKind {
        match (self, other) {
            (a, b) if a == b => a,
            (CellKind::Integer, CellKind::Float) | (CellKind::Float, CellKind::Integer) => {
                CellKind::Float
            }
            _ => CellKind::Text,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            CellKind::Integer => DataType::Int64,
            CellKind::Float => DataType::Float64,
            CellKind::Timestamp => {
                DataType::Timestamp(TimeUnit::Millisecond, Some(TIMESTAMP_TZ.into()))
            }
            CellKind::Text => DataType::Utf8,
        }
    }
}

/// Parse the date/time spellings found in police exports into millis UTC.
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

pub fn infer_cell(raw: &str) -> CellKind {
    let v = clean_str(raw);

    if v.parse::<i64>().is_ok() {
        return CellKind::Integer;
    }
    // "NaN" and "inf" parse as f64 but are labels, not measurements
    if v.parse::<f64>().map_or(false, |f| f.is_finite()) {
        return CellKind::Float;
    }
    if parse_timestamp_millis(&v).is_some() {
        return CellKind::Timestamp;
    }
    CellKind::Text
}

pub fn derive_column_kind(column: &str, values: &StringArray) -> CellKind {
    let mut seen: Option<CellKind> = None;

    for cell in values.iter().flatten() {
        if clean_str(cell).is_empty() {
            continue;
        }
        let inferred = infer_cell(cell);
        let next = match seen {
            None => inferred,
            Some(prev) => {
                let widened = prev.widen(inferred);
                if widened == CellKind::Text && prev != CellKind::Text {
                    debug!(
                        "derive_column_kind: column `{}` conflict: {:?} vs {:?}, defaulting to utf8",
                        column, prev, inferred
                    );
                }
                widened
            }
        };
        if next == CellKind::Text {
            return CellKind::Text;
        }
        seen = Some(next);
    }

    seen.unwrap_or_else(|| {
        debug!(
            "derive_column_kind: no samples for `{}`, defaulting to utf8",
            column
        );
        CellKind::Text
    })
}

/// Convert every utf8 column of `batch` into its derived type.
pub fn apply_derived_types(batch: &RecordBatch) -> Result<RecordBatch, ArrowError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (arr, field) in batch.columns().iter().zip(schema.fields()) {
        let Some(sarr) = arr.as_any().downcast_ref::<StringArray>() else {
            fields.push(field.as_ref().clone());
            columns.push(arr.clone());
            continue;
        };

        let converted: ArrayRef = match derive_column_kind(field.name(), sarr) {
            CellKind::Integer => {
                let mut b = Int64Builder::with_capacity(sarr.len());
                for opt in sarr.iter() {
                    b.append_option(opt.and_then(|s| clean_str(s).parse().ok()));
                }
                Arc::new(b.finish())
            }
            CellKind::Float => {
                let mut b = Float64Builder::with_capacity(sarr.len());
                for opt in sarr.iter() {
                    b.append_option(opt.and_then(|s| clean_str(s).parse().ok()));
                }
                Arc::new(b.finish())
            }
            CellKind::Timestamp => {
                let mut b = TimestampMillisecondBuilder::with_capacity(sarr.len());
                for opt in sarr.iter() {
                    b.append_option(opt.and_then(|s| parse_timestamp_millis(&clean_str(s))));
                }
                Arc::new(b.finish().with_timezone(TIMESTAMP_TZ))
            }
            CellKind::Text => arr.clone(),
        };

        fields.push(Field::new(field.name(), converted.data_type().clone(), true));
        columns.push(converted);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}
