//! Error types for the netmap-graph crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the snapshot has no hosts")]
    EmptySnapshot,

    #[error("Failed to encode export: {0}")]
    FailedToEncode(String),

    #[error("Export superseded before it was written")]
    Cancelled,

    #[error("Failed to write export: {0}")]
    WriteFailed(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::FailedToEncode(e.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::FailedToEncode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
