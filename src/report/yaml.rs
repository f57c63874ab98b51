use anyhow::Result;
use serde::Serialize;

use crate::models::{FilterReport, Fixes};

use super::{copyright_summary, Formatter, LicenseSummary, Settings};

pub struct YamlFormatter;

#[derive(Serialize)]
struct CopyrightSummary {
    copyrights: Vec<String>,
}

impl Formatter for YamlFormatter {
    fn format(&self, report: &FilterReport<'_>, _settings: &Settings) -> Result<String> {
        Ok(serde_yaml::to_string(report)?)
    }

    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(serde_yaml::to_string(report.cumulative)?)
    }

    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(serde_yaml::to_string(&LicenseSummary::from_report(report))?)
    }

    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(serde_yaml::to_string(&CopyrightSummary {
            copyrights: copyright_summary(report),
        })?)
    }

    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String> {
        Ok(serde_yaml::to_string(fixes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testutil::filtered_analyzer;

    #[test]
    fn test_whole_report() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = YamlFormatter.format(&report, &Settings::default()).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed["files"].as_sequence().unwrap().len(), 3);
        assert_eq!(parsed["fixes"]["excluded_files"][0]["path"].as_str(), Some("cairo/test/a.c"));
    }

    #[test]
    fn test_license_summary() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = YamlFormatter.format_license_summary(&report).unwrap();
        assert!(out.contains("missing: 1"));
    }
}
