use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

/// Per-file failure recorded by the loader. None of these stop the batch.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("{} has no header row", .0.display())]
    EmptyHeader(PathBuf),
}
