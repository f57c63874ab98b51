//! `scarfer`: filter, curate and summarize source code scan reports.
//!
//! # Flow
//! 1. Read a scanner report into a [`models::CanonicalReport`] ([`reader`]).
//! 2. Hand it to an [`analyzer::Analyzer`] and apply include/exclude
//!    [`filter`]s over file paths, licenses and copyrights.
//! 3. Optionally curate missing or wrongly detected licenses.
//! 4. Read back the filtered report, its fixes and the cumulative
//!    [`license`], and render them with a [`report`] formatter.

pub mod analyzer;
pub mod error;
pub mod filter;
pub mod license;
pub mod models;
pub mod reader;
pub mod report;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use error::{Result, ScanReportError};
pub use filter::{FileMatcher, FilterType, ScanReportFilter};
pub use reader::ScanReportReader;
