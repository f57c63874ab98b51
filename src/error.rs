//! Error types for reading, filtering and curating scan reports.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for scarfer operations.
#[derive(Debug, Error)]
pub enum ScanReportError {
    /// The scan report path does not exist. Never retried against other readers.
    #[error("File {} not found", .0.display())]
    NotFound(PathBuf),

    /// A single reader rejected the input.
    #[error("File not in {reader} format: {reason}")]
    WrongFormat { reader: &'static str, reason: String },

    /// No reader in the chain accepted the input.
    #[error("File {} not in a supported format. Rejections: {}", .path.display(), format_rejections(.rejections))]
    UnsupportedFormat {
        path: PathBuf,
        rejections: Vec<ScanReportError>,
    },

    /// A filter carries a facet outside file/license/copyright.
    #[error("Unsupported filter type: {0}")]
    UnsupportedFilterType(String),

    /// A filter expression does not compile for the selected matcher.
    #[error("Invalid filter expression '{expr}': {message}")]
    InvalidFilter { expr: String, message: String },

    /// The normalized report does not conform to the bundled schema.
    #[error("Normalized report failed schema validation: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    /// An operation that needs a filtered report was called before `apply_filters`.
    #[error("{0} called before filters were applied")]
    NotFiltered(&'static str),

    /// A curation would leave files without any license expression.
    #[error("Invalid curation: {0}")]
    InvalidCuration(String),

    #[error("IO error for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_rejections(rejections: &[ScanReportError]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Result type alias for scarfer operations.
pub type Result<T> = std::result::Result<T, ScanReportError>;
