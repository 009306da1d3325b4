use std::collections::HashMap;

use anyhow::Result;
use arrow::{
    array::{Array, Float64Array},
    compute::{max, min, sum},
    record_batch::RecordBatch,
};

use super::{numeric_values, rendered_values};

/// Descriptive statistics for one column. Numeric columns fill the moment and
/// quantile fields, everything else fills `unique`/`top`/`freq`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Linear interpolation between the closest ranks of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn summarize_numeric(column: &str, values: &Float64Array) -> ColumnSummary {
    let n = values.len() - values.null_count();
    let mean = sum(values).filter(|_| n > 0).map(|total| total / n as f64);

    let mut sorted: Vec<f64> = values.iter().flatten().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let std = match mean {
        Some(m) if n > 1 => {
            let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    ColumnSummary {
        column: column.to_string(),
        count: n,
        mean,
        std,
        min: min(values),
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: max(values),
        ..Default::default()
    }
}

fn summarize_categorical(column: &str, values: &[String]) -> ColumnSummary {
    // value -> (frequency, first row seen)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, v) in values.iter().enumerate() {
        counts.entry(v.as_str()).or_insert((0, i)).0 += 1;
    }
    let top = counts
        .iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(v, (freq, _))| (v.to_string(), *freq));

    ColumnSummary {
        column: column.to_string(),
        count: values.len(),
        unique: Some(counts.len()),
        freq: top.as_ref().map(|(_, f)| *f),
        top: top.map(|(v, _)| v),
        ..Default::default()
    }
}

pub fn describe(batch: &RecordBatch) -> Result<Vec<ColumnSummary>> {
    let schema = batch.schema();
    let mut out = Vec::with_capacity(batch.num_columns());

    for (col, field) in batch.columns().iter().zip(schema.fields()) {
        let summary = if field.data_type().is_numeric() {
            summarize_numeric(field.name(), &numeric_values(col)?)
        } else {
            summarize_categorical(field.name(), &rendered_values(col)?)
        };
        out.push(summary);
    }

    Ok(out)
}
