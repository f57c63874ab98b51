use anyhow::Result;

use crate::models::{FileRecord, FilterReport, Fixes};

use super::{copyright_summary, cumulative_text, Formatter, LicenseSummary, Settings};

pub struct TextFormatter;

impl TextFormatter {
    fn format_file(&self, f: &FileRecord, settings: &Settings) -> String {
        let mut ret = Vec::new();
        if settings.licenses {
            ret.push(format!("{}: [{}]", f.path, f.license.expressions.join(", ")));
        } else {
            ret.push(f.path.clone());
        }
        if settings.copyrights {
            for cr in &f.copyrights {
                ret.push(format!(" * {}", cr));
            }
        }
        if settings.matches {
            for m in &f.license.matches {
                ret.push(format!("--- {} --- ", m.key));
                ret.push(m.text.clone());
            }
        }
        ret.join("\n")
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &FilterReport<'_>, settings: &Settings) -> Result<String> {
        let mut lines = vec!["Files:\n----------------------------".to_string()];
        lines.extend(report.files.iter().map(|f| self.format_file(f, settings)));
        Ok(lines.join("\n"))
    }

    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(format!("Cumulative license: {}", cumulative_text(report)))
    }

    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        let summary = LicenseSummary::from_report(report);
        let mut out = format!("License:\n {}\n", summary.combined());
        if summary.missing > 0 {
            out.push_str(&format!("Files without identified license: {}\n", summary.missing));
        }
        Ok(out)
    }

    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(format!("Copyrights:\n{}\n", copyright_summary(report).join("\n")))
    }

    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String> {
        let mut lines = vec!["Filtered out:".to_string()];
        lines.extend(fixes.excluded_files.iter().map(|f| format!(" * {}", f.path)));
        lines.push("Missing license fixed:".to_string());
        lines.extend(
            fixes
                .missing_license
                .iter()
                .map(|c| format!(" * {} -> {}", c.file, c.curation.join(", "))),
        );
        lines.push("Curated licenses:".to_string());
        lines.extend(fixes.curated_licenses.iter().map(|c| {
            format!(" * {}: [{}] -> {}", c.file, c.original.join(", "), c.curation)
        }));
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testutil::filtered_analyzer;

    #[test]
    fn test_format_with_details() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let settings = Settings {
            copyrights: true,
            licenses: true,
            matches: true,
        };
        let out = TextFormatter.format(&report, &settings).unwrap();
        assert!(out.starts_with("Files:\n"));
        assert!(out.contains("cairo/src/cairo-xcb.c: [mit OR x11]\n * (c) 2009 Intel"));
        assert!(out.contains("--- mit --- \nPermission is hereby granted"));
        assert!(out.contains("cairo/util/show-events.c: [missing]"));
        assert!(!out.contains("cairo/test/a.c"));
    }

    #[test]
    fn test_format_paths_only() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = TextFormatter.format(&report, &Settings::default()).unwrap();
        assert_eq!(
            out,
            "Files:\n----------------------------\ncairo/src/cairo-xcb.c\ncairo/src/cairo.c\ncairo/util/show-events.c"
        );
    }

    #[test]
    fn test_license_summary_counts_missing() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = TextFormatter.format_license_summary(&report).unwrap();
        assert_eq!(
            out,
            "License:\n ( lgpl-2.1 OR mpl-1.1 ) AND ( mit OR x11 )\nFiles without identified license: 1\n"
        );
    }

    #[test]
    fn test_cumulative() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = TextFormatter.format_cumulative(&report).unwrap();
        assert_eq!(out, "Cumulative license: missing AND (lgpl-2.1 OR mpl-1.1) AND (mit OR x11)");
    }

    #[test]
    fn test_fixes() {
        let mut analyzer = filtered_analyzer();
        analyzer.curate_missing_license(&["mit".to_string()]).unwrap();
        let fixes = analyzer.fixes().unwrap();
        let out = TextFormatter.format_fixes(&fixes).unwrap();
        assert!(out.contains("Filtered out:\n * cairo/test/a.c"));
        assert!(out.contains("Missing license fixed:\n * cairo/util/show-events.c -> mit"));
    }
}
