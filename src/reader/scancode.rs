use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ScanReportError};
use crate::models::{CanonicalReport, FileRecord, LicenseInfo, LicenseMatch, ReportMeta, ScannerInfo};

use super::{ReportReader, ScanFormat};

const SCANCODE_TOOL: &str = "scancode-toolkit";
const HASH_FIELDS: [&str; 3] = ["sha1", "md5", "sha256"];

/// How a ScanCode output format version records licenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LicenseStyle {
    /// `license_expressions` per file, `licenses` entries with `key`/`matched_text`.
    Expressions,
    /// One `detected_license_expression` per file, `license_detections` entries.
    Detected,
}

impl ScanFormat {
    /// True if this variant reads the given `output_format_version`.
    fn accepts_version(self, version: &str) -> bool {
        match self {
            ScanFormat::ScancodeV4 => version.starts_with("4.0"),
            ScanFormat::ScancodeV3_2 => version.starts_with("3.2"),
            ScanFormat::ScancodeV3_0 => version.starts_with("3.0"),
            ScanFormat::ScancodeV2 => version.starts_with("2.0"),
            ScanFormat::ScancodeLegacy => version.is_empty() || version.starts_with("1."),
        }
    }

    fn copyright_field(self) -> &'static str {
        match self {
            ScanFormat::ScancodeLegacy => "value",
            _ => "copyright",
        }
    }

    fn licenses_field(self) -> &'static str {
        match self.license_style() {
            LicenseStyle::Expressions => "licenses",
            LicenseStyle::Detected => "license_detections",
        }
    }

    fn license_style(self) -> LicenseStyle {
        match self {
            ScanFormat::ScancodeV4 | ScanFormat::ScancodeV3_2 | ScanFormat::ScancodeV3_0 => {
                LicenseStyle::Detected
            }
            ScanFormat::ScancodeV2 | ScanFormat::ScancodeLegacy => LicenseStyle::Expressions,
        }
    }

    fn reject(self, reason: impl Into<String>) -> ScanReportError {
        ScanReportError::WrongFormat {
            reader: self.name(),
            reason: reason.into(),
        }
    }
}

impl ReportReader for ScanFormat {
    fn name(&self) -> &'static str {
        match self {
            ScanFormat::ScancodeV4 => "scancode-4.0",
            ScanFormat::ScancodeV3_2 => "scancode-3.2",
            ScanFormat::ScancodeV3_0 => "scancode-3.0",
            ScanFormat::ScancodeV2 => "scancode-2.0",
            ScanFormat::ScancodeLegacy => "scancode-legacy",
        }
    }

    fn read(&self, doc: &Value) -> Result<CanonicalReport> {
        let format = *self;
        let header = doc
            .get("headers")
            .and_then(Value::as_array)
            .and_then(|h| h.first())
            .ok_or_else(|| format.reject("no headers"))?;

        let tool = header
            .get("tool_name")
            .and_then(Value::as_str)
            .ok_or_else(|| format.reject("no tool_name in header"))?;
        if !tool.eq_ignore_ascii_case(SCANCODE_TOOL) {
            return Err(format.reject(format!("Tool={}", tool)));
        }

        let version = header
            .get("output_format_version")
            .and_then(Value::as_str)
            .unwrap_or("");
        if !format.accepts_version(version) {
            return Err(format.reject(format!("output format version '{}'", version)));
        }

        let entries = doc
            .get("files")
            .and_then(Value::as_array)
            .ok_or_else(|| format.reject("no files array"))?;

        let files: Vec<FileRecord> = entries
            .iter()
            .filter(|f| f.get("type").and_then(Value::as_str) == Some("file"))
            .map(|f| format.file_record(f))
            .collect();

        debug!(
            reader = format.name(),
            entries = entries.len(),
            files = files.len(),
            "read scan report"
        );

        Ok(CanonicalReport {
            files,
            meta: ReportMeta {
                scanner: ScannerInfo {
                    tool_name: tool.to_string(),
                    tool_version: str_field(header, "tool_version"),
                    tool_output_format: version.to_string(),
                },
            },
        })
    }
}

impl ScanFormat {
    fn file_record(self, entry: &Value) -> FileRecord {
        let path = str_field(entry, "path");

        let content_hashes: BTreeMap<String, String> = HASH_FIELDS
            .iter()
            .map(|h| (h.to_string(), str_field(entry, h)))
            .collect();

        let copyrights = self.copyrights(entry, &path);

        let detections = entry
            .get(self.licenses_field())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let license = match self.license_style() {
            LicenseStyle::Expressions => LicenseInfo {
                expressions: entry
                    .get("license_expressions")
                    .and_then(Value::as_array)
                    .map(|les| les.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default(),
                matches: detections.iter().filter_map(key_match).collect(),
            },
            LicenseStyle::Detected => LicenseInfo {
                expressions: entry
                    .get("detected_license_expression")
                    .and_then(Value::as_str)
                    .filter(|le| !le.is_empty())
                    .map(|le| vec![le.to_string()])
                    .unwrap_or_default(),
                matches: detections.iter().flat_map(detection_matches).collect(),
            },
        };

        FileRecord {
            path,
            content_hashes,
            copyrights,
            license,
        }
    }

    fn copyrights(self, entry: &Value, path: &str) -> Vec<String> {
        let field = self.copyright_field();
        let Some(items) = entry.get("copyrights").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut copyrights = Vec::with_capacity(items.len());
        for item in items {
            let statement = match item {
                Value::String(s) => Some(s.as_str()),
                _ => item.get(field).and_then(Value::as_str),
            };
            match statement {
                Some(s) => copyrights.push(s.to_string()),
                None => warn!("{}: copyright entry without '{}' skipped", path, field),
            }
        }
        copyrights
    }
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// A `key`/`matched_text` match entry; malformed entries yield `None`.
fn key_match(entry: &Value) -> Option<LicenseMatch> {
    Some(LicenseMatch {
        key: entry.get("key")?.as_str()?.to_string(),
        text: entry.get("matched_text")?.as_str()?.to_string(),
    })
}

/// Matches of one license detection: nested `matches` entries carrying
/// `license_expression`/`matched_text`, or the detection itself when it
/// carries `key`/`matched_text`.
fn detection_matches(detection: &Value) -> Vec<LicenseMatch> {
    let mut matches: Vec<LicenseMatch> = detection
        .get("matches")
        .and_then(Value::as_array)
        .map(|ms| {
            ms.iter()
                .filter_map(|m| {
                    Some(LicenseMatch {
                        key: m.get("license_expression")?.as_str()?.to_string(),
                        text: m.get("matched_text")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    matches.extend(key_match(detection));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(version: Option<&str>) -> Value {
        match version {
            Some(v) => json!({"tool_name": "scancode-toolkit", "tool_version": "32.0.0", "output_format_version": v}),
            None => json!({"tool_name": "scancode-toolkit", "tool_version": "3.1.1"}),
        }
    }

    #[test]
    fn test_rejects_other_tool() {
        let doc = json!({"headers": [{"tool_name": "fossology"}], "files": []});
        let err = ScanFormat::ScancodeV4.read(&doc).unwrap_err();
        match err {
            ScanReportError::WrongFormat { reader, reason } => {
                assert_eq!(reader, "scancode-4.0");
                assert!(reason.contains("fossology"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_other_version() {
        let doc = json!({"headers": [header(Some("2.0.0"))], "files": []});
        assert!(ScanFormat::ScancodeV3_0.read(&doc).is_err());
        assert!(ScanFormat::ScancodeV2.read(&doc).is_ok());
    }

    #[test]
    fn test_detected_style() {
        let doc = json!({
            "headers": [header(Some("3.0.0"))],
            "files": [
                {"path": "cairo", "type": "directory", "copyrights": [], "license_detections": []},
                {
                    "path": "cairo/src/cairo-xcb.c",
                    "type": "file",
                    "sha1": "da39a3ee",
                    "copyrights": [{"copyright": "Copyright (c) 2009 Intel Corporation"}],
                    "detected_license_expression": "lgpl-2.1 OR mpl-1.1",
                    "license_detections": [
                        {
                            "license_expression": "lgpl-2.1 OR mpl-1.1",
                            "matches": [
                                {"license_expression": "lgpl-2.1 OR mpl-1.1", "matched_text": "This library is free software"},
                                {"license_expression": "mpl-1.1"}
                            ]
                        }
                    ]
                },
                {
                    "path": "cairo/util/show-events.c",
                    "type": "file",
                    "copyrights": [],
                    "detected_license_expression": null,
                    "license_detections": []
                }
            ]
        });
        let report = ScanFormat::ScancodeV3_0.read(&doc).unwrap();
        assert_eq!(report.files.len(), 2);
        let xcb = &report.files[0];
        assert_eq!(xcb.license.expressions, vec!["lgpl-2.1 OR mpl-1.1"]);
        assert_eq!(xcb.license.matches.len(), 1);
        assert_eq!(xcb.copyrights, vec!["Copyright (c) 2009 Intel Corporation"]);
        assert_eq!(xcb.content_hashes["sha1"], "da39a3ee");
        assert_eq!(xcb.content_hashes["md5"], "");
        assert!(report.files[1].license.expressions.is_empty());
        assert_eq!(report.meta.scanner.tool_output_format, "3.0.0");
    }

    #[test]
    fn test_expressions_style_legacy() {
        let doc = json!({
            "headers": [header(None)],
            "files": [
                {
                    "path": "cairo/src/cairo.c",
                    "type": "file",
                    "copyrights": [{"value": "Copyright (c) 2002 University of Southern California"}, {"holders": []}],
                    "license_expressions": ["lgpl-2.1 OR mpl-1.1", "x11-keith-packard"],
                    "licenses": [
                        {"key": "lgpl-2.1", "matched_text": "GNU Lesser General Public"},
                        {"key": "mpl-1.1"}
                    ]
                }
            ]
        });
        let report = ScanFormat::ScancodeLegacy.read(&doc).unwrap();
        let file = &report.files[0];
        assert_eq!(file.license.expressions, vec!["lgpl-2.1 OR mpl-1.1", "x11-keith-packard"]);
        assert_eq!(
            file.license.matches,
            vec![LicenseMatch {
                key: "lgpl-2.1".into(),
                text: "GNU Lesser General Public".into()
            }]
        );
        assert_eq!(file.copyrights, vec!["Copyright (c) 2002 University of Southern California"]);
        assert_eq!(report.meta.scanner.tool_version, "3.1.1");
    }
}
