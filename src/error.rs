//! Error types for the pipeline.
//!
//! `LoadError` is fatal for the dataset it concerns. `SchemaError` is
//! recoverable: report sections turn it into a "no data" placeholder.

use std::path::PathBuf;
use thiserror::Error;

/// The input file could not be opened or is not tabular.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is not a tabular file: {source}", path.display())]
    NotTabular {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no header row", path.display())]
    NoHeader { path: PathBuf },
}

/// A grouping or measure column requested by an aggregation is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column '{column}' is not present in dataset '{dataset}'")]
    MissingColumn { dataset: String, column: String },

    #[error("column '{column}' in dataset '{dataset}' is not numeric")]
    NotNumeric { dataset: String, column: String },
}

/// Writing an export failed.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
