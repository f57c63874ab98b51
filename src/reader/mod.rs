//! Scan report readers.
//!
//! Every supported scanner output format is a [`ScanFormat`] variant. The
//! reader chain ([`ScanReportReader::read`]) tries them in [`READER_CHAIN`]
//! order and keeps the first one that accepts the input.

use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, ScanReportError};
use crate::models::CanonicalReport;

pub mod scancode;

/// JSON schema describing a normalized report.
pub const NORMALIZED_SCHEMA: &str = include_str!("../../var/normalized-scan.json");

/// Parses one scanner output format into a [`CanonicalReport`], or rejects it.
pub trait ReportReader {
    fn name(&self) -> &'static str;
    fn read(&self, doc: &Value) -> Result<CanonicalReport>;
}

/// Supported scanner output formats.
///
/// Each variant owns a version prefix: any `2.0.x` is read as 2.0 with the
/// `copyright` field, and only reports without a version or with `1.x` take
/// the legacy `value` field. Versions outside these prefixes are rejected
/// rather than read as legacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFormat {
    /// ScanCode output format 4.0.x
    ScancodeV4,
    /// ScanCode output format 3.2.x
    ScancodeV3_2,
    /// ScanCode output format 3.0.x
    ScancodeV3_0,
    /// ScanCode output format 2.0.x
    ScancodeV2,
    /// ScanCode output without a format version, or 1.x
    ScancodeLegacy,
}

/// Order in which the reader chain tries formats.
pub const READER_CHAIN: [ScanFormat; 5] = [
    ScanFormat::ScancodeV4,
    ScanFormat::ScancodeV3_2,
    ScanFormat::ScancodeV3_0,
    ScanFormat::ScancodeV2,
    ScanFormat::ScancodeLegacy,
];

/// Reads a scan report file into a normalized report.
#[derive(Debug, Clone)]
pub struct ScanReportReader {
    file_name: PathBuf,
}

impl ScanReportReader {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn report_file(&self) -> &Path {
        &self.file_name
    }

    /// Read the file and normalize it with the first format that accepts it.
    ///
    /// A missing file fails immediately with [`ScanReportError::NotFound`].
    /// If every format rejects the input, the error lists each rejection.
    pub fn read(&self) -> Result<CanonicalReport> {
        let content = std::fs::read_to_string(&self.file_name).map_err(|source| {
            match source.kind() {
                std::io::ErrorKind::NotFound => ScanReportError::NotFound(self.file_name.clone()),
                _ => ScanReportError::Io {
                    path: self.file_name.clone(),
                    source,
                },
            }
        })?;

        let doc: std::result::Result<Value, serde_json::Error> = serde_json::from_str(&content);

        let mut rejections = Vec::new();
        for format in READER_CHAIN {
            let attempt = match &doc {
                Ok(doc) => format.read(doc),
                Err(e) => Err(ScanReportError::WrongFormat {
                    reader: format.name(),
                    reason: format!("not JSON: {}", e),
                }),
            };
            match attempt {
                Ok(report) => {
                    info!(
                        "{}: read {} files as {}",
                        self.file_name.display(),
                        report.files.len(),
                        format.name()
                    );
                    return Ok(report);
                }
                Err(e) => {
                    debug!("{} rejected {}: {}", format.name(), self.file_name.display(), e);
                    rejections.push(e);
                }
            }
        }

        Err(ScanReportError::UnsupportedFormat {
            path: self.file_name.clone(),
            rejections,
        })
    }
}

/// Validate a normalized report against [`NORMALIZED_SCHEMA`].
pub fn validate(report: &CanonicalReport) -> Result<()> {
    validate_document(&serde_json::to_value(report)?)
}

/// Validate a JSON document against [`NORMALIZED_SCHEMA`].
pub fn validate_document(doc: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(NORMALIZED_SCHEMA)?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| ScanReportError::SchemaValidation(vec![format!("invalid schema: {}", e)]))?;

    let violations: Vec<String> = match compiled.validate(doc) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect(),
    };
    Err(ScanReportError::SchemaValidation(violations))
}
