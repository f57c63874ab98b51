use anyhow::Result;

use crate::models::{FilterReport, Fixes};

use super::text::TextFormatter;
use super::{copyright_summary, Formatter, Settings};

/// Text output with markdown headings and lists.
pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format(&self, report: &FilterReport<'_>, settings: &Settings) -> Result<String> {
        let mut lines = vec!["# Files".to_string(), String::new()];
        for f in &report.files {
            if settings.licenses {
                lines.push(format!("* `{}`: {}", f.path, f.license.expressions.join(", ")));
            } else {
                lines.push(format!("* `{}`", f.path));
            }
            if settings.copyrights {
                lines.extend(f.copyrights.iter().map(|c| format!("    * {}", c)));
            }
            if settings.matches {
                for m in &f.license.matches {
                    lines.push(format!("    * {}:", m.key));
                    lines.push(String::new());
                    lines.push("```".to_string());
                    lines.push(m.text.clone());
                    lines.push("```".to_string());
                }
            }
        }
        Ok(lines.join("\n"))
    }

    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String> {
        Ok(format!("# Cumulative license\n\n{}", TextFormatter.format_cumulative(report)?))
    }

    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        TextFormatter.format_license_summary(report)
    }

    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String> {
        let items: Vec<String> = copyright_summary(report)
            .iter()
            .map(|c| format!("* {}", c))
            .collect();
        Ok(format!("# Copyrights\n\n{}\n", items.join("\n")))
    }

    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String> {
        let mut lines = vec!["# Excluded files".to_string(), String::new()];
        lines.extend(fixes.excluded_files.iter().map(|f| format!("* {}", f.path)));
        lines.extend(["".to_string(), "# Missing license fixed".to_string(), String::new()]);
        lines.extend(
            fixes
                .missing_license
                .iter()
                .map(|c| format!("* {} -> {}", c.file, c.curation.join(", "))),
        );
        lines.extend(["".to_string(), "# Curated licenses".to_string(), String::new()]);
        lines.extend(
            fixes
                .curated_licenses
                .iter()
                .map(|c| format!("* {}: {} -> {}", c.file, c.original.join(", "), c.curation)),
        );
        Ok(lines.join("\n"))
    }
}
