use std::path::PathBuf;

use clap::Parser;

use crate::export::ExportFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "police_ingest")]
#[command(about = "Profile, classify and merge monthly police crime / stop-and-search CSVs")]
#[command(version)]
pub struct Config {
    /// Root directory holding one subdirectory per time bucket
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// File extension treated as tabular input
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Skip the per-dataset describe and profiling dumps
    #[arg(long)]
    pub skip_profile: bool,

    /// Write the unified tables and mismatch records here
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub export_format: ExportFormat,
}

impl Config {
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            extension: "csv".into(),
            skip_profile: false,
            export_dir: None,
            export_format: ExportFormat::Csv,
        }
    }
}
