//! Dataset loading: time-bucket discovery and per-file CSV reads.

pub mod infer;
pub mod reader;
pub mod utils;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use tracing::{error, info, warn};

use crate::error::LoadError;
pub use reader::{read_csv_table, read_raw_table, read_tables};
use utils::has_extension;

/// Files found in one time-bucket directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct BucketPaths {
    pub key: String,
    pub paths: Vec<PathBuf>,
}

/// One successfully loaded file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub bucket: String,
    /// 1-based position among the loaded datasets of its bucket.
    pub index: usize,
    pub path: PathBuf,
    /// Typed copy used for describing and profiling.
    pub table: RecordBatch,
    /// Cells exactly as read, all utf8. Reconciliation starts from this.
    pub raw: RecordBatch,
}

impl Dataset {
    pub fn id(&self) -> String {
        format!("{}_dataset_{}", self.bucket, self.index)
    }
}

#[derive(Debug)]
pub struct LoadedBucket {
    pub key: String,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: LoadError,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub buckets: Vec<LoadedBucket>,
    pub missing: Vec<PathBuf>,
    pub failures: Vec<LoadFailure>,
}

impl LoadOutcome {
    pub fn loaded_count(&self) -> usize {
        self.buckets.iter().map(|b| b.datasets.len()).sum()
    }

    /// All datasets in bucket order, then intra-bucket order.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.buckets.iter().flat_map(|b| b.datasets.iter())
    }

    pub fn into_datasets(self) -> impl Iterator<Item = Dataset> {
        self.buckets.into_iter().flat_map(|b| b.datasets)
    }
}

/// `extension` files directly inside `dir`, sorted. Unreadable entries are
/// logged and skipped.
fn list_files(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!(dir = %dir.display(), "skipping unreadable entry: {}", err);
                continue;
            }
        };
        if path.is_file() && has_extension(&path, extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Walk `root` for time-bucket subdirectories and the `extension` files in
/// each. Errors only when `root` itself is unusable; a bucket that cannot be
/// listed is logged and skipped.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<BucketPaths>> {
    if !root.is_dir() {
        bail!(
            "the directory `{}` does not exist, please check your path",
            root.display()
        );
    }

    let mut buckets = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("reading directory {:?}", root))? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!(root = %root.display(), "skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !path.is_dir() {
            continue;
        }
        let Some(key) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        match list_files(&path, extension) {
            Ok(paths) => buckets.push(BucketPaths { key, paths }),
            Err(err) => warn!(bucket = %key, "skipping unreadable bucket: {}", err),
        }
    }

    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(buckets)
}

/// Load every discovered path. Nothing here aborts the batch: absent files
/// land in `missing`, unreadable ones in `failures`.
pub fn load(buckets: Vec<BucketPaths>) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for bucket in buckets {
        let mut datasets = Vec::with_capacity(bucket.paths.len());

        for path in bucket.paths {
            if !path.exists() {
                warn!(path = %path.display(), "file not found");
                outcome.missing.push(path);
                continue;
            }

            match read_tables(&path) {
                Ok((raw, table)) => {
                    info!(
                        path = %path.display(),
                        rows = table.num_rows(),
                        columns = table.num_columns(),
                        "loaded"
                    );
                    datasets.push(Dataset {
                        bucket: bucket.key.clone(),
                        index: datasets.len() + 1,
                        path,
                        table,
                        raw,
                    });
                }
                Err(LoadError::NotFound(_)) => {
                    warn!(path = %path.display(), "file not found");
                    outcome.missing.push(path);
                }
                Err(err) => {
                    error!(path = %path.display(), "error loading: {}", err);
                    outcome.failures.push(LoadFailure { path, error: err });
                }
            }
        }

        outcome.buckets.push(LoadedBucket {
            key: bucket.key,
            datasets,
        });
    }

    outcome
}
