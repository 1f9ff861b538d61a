use std::path::PathBuf;

use thiserror::Error;

use crate::chart::ChartKind;
use crate::data::loader::Encoding;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Everything the data core can fail with.
///
/// Load-time variants (`Io`, `Csv`, `Json`, `Parquet`, `Arrow`,
/// `UnsupportedFormat`, `Schema`, `DuplicateColumns`) abort the load; no partial dataset is
/// returned. The remaining variants are per-interaction and are expected to be
/// rendered as a placeholder by the caller.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed parquet data: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("malformed arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("row {row} is not valid {encoding}")]
    Encoding { encoding: Encoding, row: usize },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("dataset is missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("dataset repeats column header(s): {}", duplicated.join(", "))]
    DuplicateColumns { duplicated: Vec<String> },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("{kind} chart needs a '{channel}' column")]
    MissingEncoding {
        kind: ChartKind,
        channel: &'static str,
    },

    #[error("histogram bin count must be at least 1")]
    InvalidBins,

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl DashboardError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DashboardError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from loading a file rather than from a request
    /// against an already-loaded dataset.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Io { .. }
                | DashboardError::Csv(_)
                | DashboardError::Json(_)
                | DashboardError::Parquet(_)
                | DashboardError::Arrow(_)
                | DashboardError::Encoding { .. }
                | DashboardError::UnsupportedFormat(_)
                | DashboardError::Schema { .. }
                | DashboardError::DuplicateColumns { .. }
        )
    }
}
