use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// License value used for files where no license was identified.
pub const MISSING_LICENSE: &str = "missing";

/// One scanned file in a normalized report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    /// Hash algorithm name (`sha1`, `md5`, `sha256`) to hex digest.
    #[serde(flatten)]
    pub content_hashes: BTreeMap<String, String>,
    #[serde(default)]
    pub copyrights: Vec<String>,
    pub license: LicenseInfo,
}

impl FileRecord {
    /// True if the record carries exactly the `missing` sentinel.
    pub fn is_missing_license(&self) -> bool {
        self.license.expressions.len() == 1 && self.license.expressions[0] == MISSING_LICENSE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// License expressions, e.g. `"mit OR x11"`.
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub matches: Vec<LicenseMatch>,
}

/// A matched license key with the source text it was matched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseMatch {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannerInfo {
    pub tool_name: String,
    pub tool_version: String,
    pub tool_output_format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub scanner: ScannerInfo,
}

/// Normalized, scanner-independent representation of a scan report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    pub files: Vec<FileRecord>,
    pub meta: ReportMeta,
}

/// A file cured from the `missing` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingLicenseFix {
    pub file: String,
    pub curation: Vec<String>,
}

/// A file whose license was manually overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedLicenseFix {
    pub file: String,
    pub curation: String,
    pub original: Vec<String>,
}

/// Excluded files and curations, borrowed from the analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct Fixes<'a> {
    pub excluded_files: Vec<&'a FileRecord>,
    pub missing_license: &'a [MissingLicenseFix],
    pub curated_licenses: &'a [CuratedLicenseFix],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cumulative {
    /// Simplified AND of every license expression, `None` when nothing could be combined.
    pub license: Option<String>,
}

/// Read-only view of a filtered report.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport<'a> {
    pub files: Vec<&'a FileRecord>,
    pub fixes: Fixes<'a>,
    pub meta: &'a ReportMeta,
    pub cumulative: &'a Cumulative,
}
