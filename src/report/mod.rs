//! Output formatters for filtered reports.
//!
//! - [`text`]: plain text, one file per line.
//! - [`markdown`]: text with markdown headings and lists.
//! - [`json`] / [`yaml`]: serialized data.
//! - [`terminal`]: tables for interactive use.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;

use crate::models::{FilterReport, Fixes, MISSING_LICENSE};

pub mod json;
pub mod markdown;
pub mod terminal;
pub mod text;
pub mod yaml;

/// Which per-file details to render.
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    pub copyrights: bool,
    pub licenses: bool,
    pub matches: bool,
}

pub trait Formatter {
    fn format(&self, report: &FilterReport<'_>, settings: &Settings) -> Result<String>;
    fn format_cumulative(&self, report: &FilterReport<'_>) -> Result<String>;
    fn format_license_summary(&self, report: &FilterReport<'_>) -> Result<String>;
    fn format_copyright_summary(&self, report: &FilterReport<'_>) -> Result<String>;
    fn format_fixes(&self, fixes: &Fixes<'_>) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[value(alias = "txt")]
    Text,
    #[value(alias = "md")]
    Markdown,
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    /// Look up a format by name, ignoring case. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "table" => Some(OutputFormat::Table),
            _ => None,
        }
    }

    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            OutputFormat::Text => Box::new(text::TextFormatter),
            OutputFormat::Markdown => Box::new(markdown::MarkdownFormatter),
            OutputFormat::Json => Box::new(json::JsonFormatter),
            OutputFormat::Yaml => Box::new(yaml::YamlFormatter),
            OutputFormat::Table => Box::new(terminal::TableFormatter),
        }
    }
}

/// Formatter for a format name, `None` if the name is unknown.
pub fn formatter(name: &str) -> Option<Box<dyn Formatter>> {
    OutputFormat::from_name(name).map(OutputFormat::formatter)
}

/// Distinct license expressions of the reported files.
///
/// The `missing` sentinel is not a license; files carrying it are counted
/// in `missing` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LicenseSummary {
    pub licenses: Vec<String>,
    pub missing: usize,
}

impl LicenseSummary {
    pub fn from_report(report: &FilterReport<'_>) -> Self {
        let mut licenses = BTreeSet::new();
        let mut missing = 0;
        for file in &report.files {
            if file.is_missing_license() {
                missing += 1;
                continue;
            }
            licenses.extend(
                file.license
                    .expressions
                    .iter()
                    .filter(|le| le.as_str() != MISSING_LICENSE)
                    .cloned(),
            );
        }
        Self {
            licenses: licenses.into_iter().collect(),
            missing,
        }
    }

    /// `( a ) AND ( b )`
    pub fn combined(&self) -> String {
        self.licenses
            .iter()
            .map(|l| format!("( {} )", l))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Distinct copyright statements of the reported files, sorted.
pub fn copyright_summary(report: &FilterReport<'_>) -> Vec<String> {
    report
        .files
        .iter()
        .flat_map(|f| f.copyrights.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn cumulative_text<'a>(report: &'a FilterReport<'a>) -> &'a str {
    report.cumulative.license.as_deref().unwrap_or("none")
}
