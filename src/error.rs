use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name} is not readable as CSV: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name} is missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("invalid configuration file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type LoadResult<T> = Result<T, DataLoadError>;
