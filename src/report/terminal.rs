use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::models::{FilterReport, Fixes};

use super::text::TextFormatter;
use super::{copyright_summary, Formatter, LicenseSummary, Settings};

/// Tabular output for interactive use.
pub struct TableFormatter;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

impl Formatter for TableFormatter {
    fn format(&self, report: &FilterReport<'_>, settings: &Settings) -> Result<String> {
        let mut headers = vec!["Path"];
        if settings.licenses {
            headers.push("License");
        }
        if settings.copyrights {
            headers.push("Copyrights");
        }
        let mut table = new_table(&headers);

        for f in &report.files {
            let mut row = vec![Cell::new(&f.path)];
            if settings.licenses {
                row.push(Cell::new(f.license.expressions.join("\n")));
            }
            if settings.copyrights {
                row.push(Cell::new(f.copyrights.join("\n")));
            }
            table.add_row(row);
        }
        Ok(table.to_string())
    }

    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String> {
        TextFormatter.format_cumulative(report)
    }

    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        let summary = LicenseSummary::from_report(report);
        let mut table = new_table(&["License", "Files"]);
        for license in &summary.licenses {
            let count = report
                .files
                .iter()
                .filter(|f| f.license.expressions.contains(license))
                .count();
            table.add_row(vec![
                Cell::new(license),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
        if summary.missing > 0 {
            table.add_row(vec![
                Cell::new("(no license identified)").add_attribute(Attribute::Italic),
                Cell::new(summary.missing).set_alignment(CellAlignment::Right),
            ]);
        }
        Ok(table.to_string())
    }

    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        let mut table = new_table(&["Copyright"]);
        for c in copyright_summary(report) {
            table.add_row(vec![Cell::new(c)]);
        }
        Ok(table.to_string())
    }

    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String> {
        let mut table = new_table(&["Fix", "File", "Detail"]);
        for f in &fixes.excluded_files {
            table.add_row(vec![Cell::new("excluded"), Cell::new(&f.path), Cell::new("")]);
        }
        for c in fixes.missing_license {
            table.add_row(vec![
                Cell::new("missing license"),
                Cell::new(&c.file),
                Cell::new(c.curation.join(", ")),
            ]);
        }
        for c in fixes.curated_licenses {
            table.add_row(vec![
                Cell::new("curated"),
                Cell::new(&c.file),
                Cell::new(format!("{} -> {}", c.original.join(", "), c.curation)),
            ]);
        }
        Ok(table.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testutil::filtered_analyzer;

    #[test]
    fn test_license_summary_table() {
        let analyzer = filtered_analyzer();
        let report = analyzer.report().unwrap();
        let out = TableFormatter.format_license_summary(&report).unwrap();
        assert!(out.contains("mit OR x11"));
        assert!(out.contains("(no license identified)"));
    }

    #[test]
    fn test_fixes_table() {
        let mut analyzer = filtered_analyzer();
        let fixes = analyzer.fixes().unwrap();
        let out = TableFormatter.format_fixes(&fixes).unwrap();
        assert!(out.contains("excluded"));
        assert!(out.contains("cairo/test/a.c"));
    }
}
