//! Console rendering. Every section writes to any `io::Write` so the binary
//! can target stdout and tests can target a buffer.

use std::io::{self, Write};

use crate::{
    aggregate::{missing_counts, UnifiedTable, UnifiedTables},
    load::LoadOutcome,
    profile::{ColumnProfile, ColumnSummary},
    schema::{MismatchRecord, RecordType},
};

const RULE: &str =
    "--------------------------------------------------------------------------------";

fn stat(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |x| format!("{:.4}", x))
}

fn count(v: Option<usize>) -> String {
    v.map_or_else(|| "-".to_string(), |x| x.to_string())
}

pub fn write_load_summary<W: Write>(out: &mut W, outcome: &LoadOutcome) -> io::Result<()> {
    writeln!(out, "\n**Summary Report**")?;
    writeln!(
        out,
        "Successfully loaded {} dataset(s) across {} time bucket(s)",
        outcome.loaded_count(),
        outcome.buckets.len()
    )?;

    if !outcome.missing.is_empty() {
        writeln!(out, "\n**Missing Files List:**")?;
        for path in &outcome.missing {
            writeln!(out, "- {}", path.display())?;
        }
    }

    if !outcome.failures.is_empty() {
        writeln!(out, "\n**Failed Files List:**")?;
        for failure in &outcome.failures {
            writeln!(out, "- {}", failure.error)?;
        }
    }
    Ok(())
}

pub fn write_description<W: Write>(
    out: &mut W,
    bucket: &str,
    index: usize,
    summaries: &[ColumnSummary],
) -> io::Result<()> {
    writeln!(out, "Dataset {} in {}:", index, bucket)?;
    writeln!(
        out,
        "{:<25} {:>6} {:>6} {:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "COLUMN", "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    for s in summaries {
        let top: String = s.top.as_deref().unwrap_or("-").chars().take(20).collect();
        writeln!(
            out,
            "{:<25} {:>6} {:>6} {:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.column,
            s.count,
            count(s.unique),
            top,
            count(s.freq),
            stat(s.mean),
            stat(s.std),
            stat(s.min),
            stat(s.q25),
            stat(s.q50),
            stat(s.q75),
            stat(s.max),
        )?;
    }
    writeln!(out, "\n{}\n", "-".repeat(50))
}

pub fn write_profile<W: Write>(
    out: &mut W,
    index: usize,
    rows: usize,
    profiles: &[ColumnProfile],
) -> io::Result<()> {
    writeln!(
        out,
        "\nDataset {} (contains {} rows, {} columns)",
        index,
        rows,
        profiles.len()
    )?;
    writeln!(
        out,
        "\n{:<25} {:<15} {:<20} {}",
        "COLUMN", "DATA TYPE", "MEASUREMENT SCALE", "SAMPLE VALUES"
    )?;
    writeln!(out, "{}", RULE)?;
    for p in profiles {
        writeln!(
            out,
            "{:<25} {:<15} {:<20} {:?}",
            p.column,
            p.data_type,
            p.scale.to_string(),
            p.samples
        )?;
    }
    writeln!(out, "\n{}", "-".repeat(50))
}

pub fn write_bucket_banner<W: Write>(out: &mut W, title: &str, bucket: &str) -> io::Result<()> {
    let bar = "=".repeat(50);
    writeln!(out, "\n{}\n{} {}:\n{}", bar, title, bucket, bar)
}

pub fn write_mismatches<W: Write>(
    out: &mut W,
    record_type: RecordType,
    mismatches: &[MismatchRecord],
) -> io::Result<()> {
    writeln!(out, "\n**{} mismatch**: {} dataset(s)", record_type, mismatches.len())?;
    for m in mismatches {
        writeln!(
            out,
            "- {}: missing {:?}, extra {:?}",
            m.dataset, m.missing_cols, m.extra_cols
        )?;
    }
    Ok(())
}

pub fn write_rejected<W: Write>(out: &mut W, dataset: &str, duplicates: &[String]) -> io::Result<()> {
    writeln!(
        out,
        "Skipped {}: duplicate columns after stripping names {:?}",
        dataset, duplicates
    )
}

fn write_missing_counts<W: Write>(out: &mut W, unified: &UnifiedTable) -> io::Result<()> {
    writeln!(
        out,
        "\n{} table missing values ({} rows):",
        unified.record_type,
        unified.table.num_rows()
    )?;
    for (column, n) in missing_counts(&unified.table) {
        writeln!(out, "{:<45} {}", column, n)?;
    }
    Ok(())
}

pub fn not_found_message(record_type: RecordType) -> String {
    format!("No {} datasets were found.", record_type)
}

pub fn write_unified_summary<W: Write>(out: &mut W, unified: &UnifiedTables) -> io::Result<()> {
    // stop-and-search first, then crime
    let order = [RecordType::StopAndSearch, RecordType::Crime];

    for record_type in order {
        if unified.get(record_type).is_empty() {
            writeln!(out, "{}", not_found_message(record_type))?;
        }
    }
    for record_type in order {
        write_mismatches(out, record_type, &unified.get(record_type).mismatches)?;
    }
    for record_type in order {
        write_missing_counts(out, unified.get(record_type))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MeasurementScale;

    #[test]
    fn profile_table_layout() {
        let profiles = vec![ColumnProfile {
            column: "Age range".into(),
            data_type: "text".into(),
            scale: MeasurementScale::Ordinal,
            samples: vec!["18-24".into(), "over 34".into()],
        }];
        let mut buf = Vec::new();
        write_profile(&mut buf, 2, 40, &profiles).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Dataset 2 (contains 40 rows, 1 columns)"));
        let header = format!(
            "{:<25} {:<15} {:<20} {}",
            "COLUMN", "DATA TYPE", "MEASUREMENT SCALE", "SAMPLE VALUES"
        );
        assert!(text.contains(&header));
        let row = format!(
            "{:<25} {:<15} {:<20} {}",
            "Age range", "text", "Ordinal", "[\"18-24\", \"over 34\"]"
        );
        assert!(text.contains(&row));
    }

    #[test]
    fn mismatch_lines_name_the_dataset() {
        let mut buf = Vec::new();
        write_mismatches(
            &mut buf,
            RecordType::Crime,
            &[MismatchRecord {
                dataset: "2024-01_dataset_1".into(),
                missing_cols: vec!["Context".into()],
                extra_cols: vec![],
            }],
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("**crime mismatch**: 1 dataset(s)"));
        assert!(text.contains("- 2024-01_dataset_1: missing [\"Context\"], extra []"));
    }
}
