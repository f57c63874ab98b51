use anyhow::Result;
use serde_json::json;

use crate::models::{FilterReport, Fixes};

use super::{copyright_summary, Formatter, LicenseSummary, Settings};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, report: &FilterReport<'_>, _settings: &Settings) -> Result<String> {
        Ok(serde_json::to_string_pretty(&report.files)?)
    }

    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(serde_json::to_string_pretty(report.cumulative)?)
    }

    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        let summary = LicenseSummary::from_report(report);
        Ok(serde_json::to_string_pretty(&json!({
            "license": summary.licenses.join(" AND "),
            "missing": summary.missing,
        }))?)
    }

    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&json!({
            "copyrights": copyright_summary(report),
        }))?)
    }

    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String> {
        Ok(serde_json::to_string_pretty(fixes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testutil::filtered_analyzer;
    use serde_json::Value;

    #[test]
    fn test_files_as_json() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = JsonFormatter.format(&report, &Settings::default()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[2]["license"]["expressions"][0], "missing");
    }

    #[test]
    fn test_cumulative_and_summary() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let cumulative: Value =
            serde_json::from_str(&JsonFormatter.format_cumulative(&report).unwrap()).unwrap();
        assert_eq!(
            cumulative["license"],
            "missing AND (lgpl-2.1 OR mpl-1.1) AND (mit OR x11)"
        );

        let summary: Value =
            serde_json::from_str(&JsonFormatter.format_license_summary(&report).unwrap()).unwrap();
        assert_eq!(summary["missing"], 1);
    }

    #[test]
    fn test_fixes_as_json() {
        let mut analyzer = filtered_analyzer();
        analyzer
            .curate_file_license(&["cairo.c".to_string()], "mpl-1.1")
            .unwrap();
        let fixes = analyzer.fixes().unwrap();
        let parsed: Value = serde_json::from_str(&JsonFormatter.format_fixes(&fixes).unwrap()).unwrap();
        assert_eq!(parsed["excluded_files"][0]["path"], "cairo/test/a.c");
        assert_eq!(parsed["curated_licenses"][0]["original"][0], "lgpl-2.1 OR mpl-1.1");
    }
}
