//! Column profiling: descriptive statistics and measurement-scale labels.

pub mod describe;
pub mod scale;

use std::collections::HashSet;

use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array},
    compute::{cast, min},
    datatypes::{DataType, Float64Type},
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};

pub use describe::{describe, ColumnSummary};
pub use scale::{classify_scale, ColumnFacts, MeasurementScale, ValueKind};

const SAMPLE_VALUES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub column: String,
    pub data_type: String,
    pub scale: MeasurementScale,
    pub samples: Vec<String>,
}

/// Short type label for the profile table.
pub fn data_type_label(data_type: &DataType) -> String {
    match data_type {
        DataType::Int64 => "int64".into(),
        DataType::Float64 => "float64".into(),
        DataType::Utf8 | DataType::LargeUtf8 => "text".into(),
        dt if dt.is_temporal() => "datetime".into(),
        dt => format!("{dt:?}").to_lowercase(),
    }
}

/// Non-null values rendered as text, in row order.
pub(crate) fn rendered_values(col: &ArrayRef) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(col.len() - col.null_count());
    for i in 0..col.len() {
        if col.is_valid(i) {
            out.push(array_value_to_string(col.as_ref(), i)?);
        }
    }
    Ok(out)
}

pub(crate) fn numeric_values(col: &ArrayRef) -> Result<Float64Array> {
    let floats = cast(col.as_ref(), &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().clone())
}

fn column_facts(name: &str, col: &ArrayRef) -> Result<ColumnFacts> {
    let kind = if col.data_type().is_numeric() {
        ValueKind::Numeric {
            min: min(&numeric_values(col)?),
        }
    } else {
        let distinct: HashSet<String> = rendered_values(col)?.into_iter().collect();
        ValueKind::Categorical {
            distinct: distinct.len(),
            temporal: col.data_type().is_temporal(),
        }
    };
    Ok(ColumnFacts::new(name, kind))
}

fn sample_values(col: &ArrayRef) -> Result<Vec<String>> {
    let mut samples = Vec::with_capacity(SAMPLE_VALUES);
    for i in (0..col.len()).filter(|&i| col.is_valid(i)).take(SAMPLE_VALUES) {
        samples.push(array_value_to_string(col.as_ref(), i)?);
    }
    Ok(samples)
}

/// One profile per column, in table order.
pub fn profile_table(batch: &RecordBatch) -> Result<Vec<ColumnProfile>> {
    let schema = batch.schema();
    let mut profiles = Vec::with_capacity(batch.num_columns());

    for (col, field) in batch.columns().iter().zip(schema.fields()) {
        let facts = column_facts(field.name(), col)?;
        profiles.push(ColumnProfile {
            column: field.name().clone(),
            data_type: data_type_label(field.data_type()),
            scale: classify_scale(&facts),
            samples: sample_values(col)?,
        });
    }

    Ok(profiles)
}
