use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use clap::ValueEnum;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use serde::Serialize;
use tracing::info;

use crate::{
    aggregate::UnifiedTables,
    schema::{MismatchRecord, RecordType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

#[derive(Serialize)]
struct MismatchReport<'a> {
    stop_and_search: &'a [MismatchRecord],
    crime: &'a [MismatchRecord],
}

fn write_csv_file(batch: &RecordBatch, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch).context("writing batch to csv")?;
    writer
        .into_inner()
        .flush()
        .with_context(|| format!("flushing {}", output_path.display()))?;
    Ok(())
}

fn write_parquet_file(batch: &RecordBatch, output_path: &Path) -> Result<u64> {
    let file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;

    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let metadata = fs::metadata(output_path).context("getting file metadata")?;
    Ok(metadata.len())
}

fn write_mismatches(unified: &UnifiedTables, output_path: &Path) -> Result<()> {
    let report = MismatchReport {
        stop_and_search: &unified.stop_and_search.mismatches,
        crime: &unified.crime.mismatches,
    };
    let mut file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;
    serde_json::to_writer_pretty(&mut file, &report).context("serializing mismatches")?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Persist the unified tables and mismatch records under `dir`.
///
/// Empty unified tables are skipped. Returns every file written.
pub fn export(dir: &Path, format: ExportFormat, unified: &UnifiedTables) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut written = Vec::new();

    for record_type in RecordType::ALL {
        let table = unified.get(record_type);
        if table.is_empty() {
            info!("no {} rows to export, skipping", record_type);
            continue;
        }

        let path = dir.join(format!("{}.{}", record_type.file_stem(), format.extension()));
        match format {
            ExportFormat::Csv => write_csv_file(&table.table, &path)?,
            ExportFormat::Parquet => {
                let bytes = write_parquet_file(&table.table, &path)?;
                info!(bytes, "parquet size for {}", record_type);
            }
        }
        info!(path = %path.display(), rows = table.table.num_rows(), "exported");
        written.push(path);
    }

    let path = dir.join("mismatches.json");
    write_mismatches(unified, &path)?;
    written.push(path);

    Ok(written)
}
