//! Filter predicates over the file, license and copyright facets.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanReportError};
use crate::models::{FileRecord, MISSING_LICENSE};

/// Default path exclusion rules shipped with scarfer.
pub const DEFAULT_EXCLUDE_RULES: &str = include_str!("../var/default-exclude-files.txt");

/// The attribute of a file record a filter matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    File,
    License,
    Copyright,
}

impl FromStr for FilterType {
    type Err = ScanReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(FilterType::File),
            "license" => Ok(FilterType::License),
            "copyright" => Ok(FilterType::Copyright),
            other => Err(ScanReportError::UnsupportedFilterType(other.to_string())),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::File => write!(f, "file"),
            FilterType::License => write!(f, "license"),
            FilterType::Copyright => write!(f, "copyright"),
        }
    }
}

/// How FILE filters (and file curations) are matched against paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileMatcher {
    /// Regular expression search anywhere in the path.
    #[default]
    Regex,
    /// Shell glob matched against the full path.
    Glob,
}

/// A single (expression, facet) filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReportFilter {
    pub expr: String,
    #[serde(rename = "type")]
    pub kind: FilterType,
}

impl ScanReportFilter {
    pub fn new(expr: impl Into<String>, kind: FilterType) -> Self {
        Self {
            expr: expr.into(),
            kind,
        }
    }

    pub fn file(expr: impl Into<String>) -> Self {
        Self::new(expr, FilterType::File)
    }

    pub fn license(expr: impl Into<String>) -> Self {
        Self::new(expr, FilterType::License)
    }

    pub fn copyright(expr: impl Into<String>) -> Self {
        Self::new(expr, FilterType::Copyright)
    }

    /// Compile the expression for the given matcher.
    pub fn compile(&self, matcher: FileMatcher) -> Result<CompiledFilter> {
        let pattern = match (self.kind, matcher) {
            (FilterType::File, FileMatcher::Glob) => Pattern::Glob(compile_glob(&self.expr)?),
            _ => Pattern::Regex(compile_regex(&self.expr)?),
        };
        Ok(CompiledFilter {
            expr: self.expr.clone(),
            kind: self.kind,
            pattern,
        })
    }
}

impl fmt::Display for ScanReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr: {}, type: {}", self.expr, self.kind)
    }
}

/// Build filters from per-facet expression lists.
pub fn create_filters(licenses: &[String], copyrights: &[String], files: &[String]) -> Vec<ScanReportFilter> {
    licenses
        .iter()
        .map(|e| ScanReportFilter::license(e.as_str()))
        .chain(copyrights.iter().map(|e| ScanReportFilter::copyright(e.as_str())))
        .chain(files.iter().map(|e| ScanReportFilter::file(e.as_str())))
        .collect()
}

#[derive(Debug, Clone)]
enum Pattern {
    Regex(Regex),
    Glob(GlobMatcher),
}

impl Pattern {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(text),
            Pattern::Glob(glob) => glob.is_match(text),
        }
    }
}

/// A filter ready to be applied to file records.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    expr: String,
    kind: FilterType,
    pattern: Pattern,
}

impl CompiledFilter {
    pub fn kind(&self) -> FilterType {
        self.kind
    }

    /// True if `file` matches this filter on its facet.
    pub fn matches(&self, file: &FileRecord) -> bool {
        match self.kind {
            FilterType::File => self.pattern.is_match(&file.path),
            FilterType::License => {
                let expressions = &file.license.expressions;
                if expressions.is_empty() {
                    // not yet normalized to the sentinel
                    self.expr == MISSING_LICENSE
                } else {
                    expressions.iter().any(|le| self.pattern.is_match(le))
                }
            }
            FilterType::Copyright => file.copyrights.iter().any(|c| self.pattern.is_match(c)),
        }
    }
}

/// True if `file` matches at least one filter of the selected facets.
pub fn matches_any(filters: &[CompiledFilter], file: &FileRecord, on_files: bool) -> bool {
    filters
        .iter()
        .filter(|f| (f.kind == FilterType::File) == on_files)
        .any(|f| f.matches(file))
}

/// Path selector used by file curations: substring containment, or glob.
#[derive(Debug, Clone)]
pub enum PathPattern {
    Substring(String),
    Glob(GlobMatcher),
}

impl PathPattern {
    pub fn new(matcher: FileMatcher, expr: &str) -> Result<Self> {
        match matcher {
            FileMatcher::Regex => Ok(PathPattern::Substring(expr.to_string())),
            FileMatcher::Glob => Ok(PathPattern::Glob(compile_glob(expr)?)),
        }
    }

    pub fn is_match(&self, path: &str) -> bool {
        match self {
            PathPattern::Substring(s) => path.contains(s.as_str()),
            PathPattern::Glob(glob) => glob.is_match(path),
        }
    }
}

fn compile_regex(expr: &str) -> Result<Regex> {
    Regex::new(expr).map_err(|e| ScanReportError::InvalidFilter {
        expr: expr.to_string(),
        message: e.to_string(),
    })
}

fn compile_glob(expr: &str) -> Result<GlobMatcher> {
    Glob::new(expr)
        .map(|g| g.compile_matcher())
        .map_err(|e| ScanReportError::InvalidFilter {
            expr: expr.to_string(),
            message: e.to_string(),
        })
}

/// Parse newline-delimited path rules.
///
/// Comment lines (`#`) and blank lines are ignored. A rule that does not end
/// with `/` is anchored to the end of the path.
pub fn parse_filter_rules(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.ends_with('/') {
                line.to_string()
            } else {
                format!("{}$", line)
            }
        })
        .collect()
}

/// Read path rules from a filter file.
pub fn read_filter_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ScanReportError::NotFound(path.to_path_buf()),
        _ => ScanReportError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Ok(parse_filter_rules(&content))
}
