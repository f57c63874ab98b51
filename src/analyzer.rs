//! Filter & curation engine.
//!
//! The [`Analyzer`] owns every file record of one normalized report and
//! addresses them by index. Filtering produces index lists (kept and
//! excluded), so a curation that rewrites a record is seen by every view.

use tracing::{debug, info};

use crate::error::{Result, ScanReportError};
use crate::filter::{
    matches_any, CompiledFilter, FileMatcher, FilterType, PathPattern, ScanReportFilter,
};
use crate::license::cumulative_license;
use crate::models::{
    CanonicalReport, CuratedLicenseFix, Cumulative, FileRecord, FilterReport, Fixes,
    MissingLicenseFix, ReportMeta, MISSING_LICENSE,
};

/// Settings fixed when an [`Analyzer`] is created.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub file_matcher: FileMatcher,
    /// FILE exclusions added to every `apply_filters` call.
    pub default_excludes: Vec<String>,
}

/// Result of the latest `apply_filters` call, plus curations made since.
#[derive(Debug, Default)]
struct FilterState {
    kept: Vec<usize>,
    excluded: Vec<usize>,
    missing_license: Vec<MissingLicenseFix>,
    curated_licenses: Vec<CuratedLicenseFix>,
    cumulative: Cumulative,
}

pub struct Analyzer {
    records: Vec<FileRecord>,
    meta: ReportMeta,
    config: AnalyzerConfig,
    state: Option<FilterState>,
}

impl Analyzer {
    /// Create an analyzer with the regex matcher and no default exclusions.
    pub fn new(report: CanonicalReport) -> Self {
        Self::with_config(report, AnalyzerConfig::default())
    }

    pub fn with_config(report: CanonicalReport, config: AnalyzerConfig) -> Self {
        Self {
            records: report.files,
            meta: report.meta,
            config,
            state: None,
        }
    }

    /// All records of the source report, in source order.
    pub fn files(&self) -> &[FileRecord] {
        &self.records
    }

    /// Filter the report.
    ///
    /// Passes run in order: include by file, include by license or copyright,
    /// exclude by file, exclude by license or copyright. A pass with no
    /// filters of its facets keeps everything. Within a pass a record matches
    /// if any filter matches. Excluded records are never re-evaluated.
    ///
    /// Surviving records without a license get the `missing` sentinel.
    /// Curations recorded by earlier calls are discarded.
    pub fn apply_filters(
        &mut self,
        filters: &[ScanReportFilter],
        exclude_filters: &[ScanReportFilter],
    ) -> Result<()> {
        self.filter_records(filters, exclude_filters, true)
    }

    fn filter_records(
        &mut self,
        filters: &[ScanReportFilter],
        exclude_filters: &[ScanReportFilter],
        with_default_excludes: bool,
    ) -> Result<()> {
        let matcher = self.config.file_matcher;
        let includes = compile_all(filters, matcher)?;
        let mut excludes = compile_all(exclude_filters, matcher)?;
        if with_default_excludes {
            for rule in &self.config.default_excludes {
                excludes.push(ScanReportFilter::file(rule.as_str()).compile(matcher)?);
            }
        }

        let mut kept: Vec<usize> = (0..self.records.len()).collect();
        let mut excluded: Vec<usize> = Vec::new();

        if has_facet(&includes, true) {
            self.run_pass(&mut kept, &mut excluded, &includes, true, true);
        }
        if has_facet(&includes, false) {
            self.run_pass(&mut kept, &mut excluded, &includes, false, true);
        }
        if has_facet(&excludes, true) {
            self.run_pass(&mut kept, &mut excluded, &excludes, true, false);
        }
        if has_facet(&excludes, false) {
            self.run_pass(&mut kept, &mut excluded, &excludes, false, false);
        }

        for &i in &kept {
            let license = &mut self.records[i].license;
            if license.expressions.is_empty() {
                license.expressions = vec![MISSING_LICENSE.to_string()];
            }
        }

        let cumulative = Cumulative {
            license: cumulative_license(kept.iter().map(|&i| &self.records[i])),
        };

        info!(
            kept = kept.len(),
            excluded = excluded.len(),
            "applied {} include and {} exclude filters",
            includes.len(),
            excludes.len()
        );

        self.state = Some(FilterState {
            kept,
            excluded,
            cumulative,
            ..FilterState::default()
        });
        Ok(())
    }

    /// One filter pass. Include passes keep matching records, exclude passes
    /// drop them; dropped records are appended to `excluded`.
    fn run_pass(
        &self,
        kept: &mut Vec<usize>,
        excluded: &mut Vec<usize>,
        filters: &[CompiledFilter],
        on_files: bool,
        include: bool,
    ) {
        let before = kept.len();
        let facet = if on_files { "file" } else { "license/copyright" };
        let (keep, drop): (Vec<usize>, Vec<usize>) = kept
            .iter()
            .partition(|&&i| matches_any(filters, &self.records[i], on_files) == include);
        *kept = keep;
        excluded.extend(drop);
        debug!(
            facet,
            include,
            before,
            after = kept.len(),
            "filter pass"
        );
    }

    /// Replace the license of every `missing` record with `curated_license`.
    ///
    /// Applies to all records of the source report, including excluded ones.
    /// The cumulative license is recomputed over all records.
    pub fn curate_missing_license(&mut self, curated_license: &[String]) -> Result<()> {
        if curated_license.is_empty() {
            return Err(ScanReportError::InvalidCuration(
                "curated license list is empty".to_string(),
            ));
        }
        let state = self
            .state
            .as_mut()
            .ok_or(ScanReportError::NotFiltered("curate_missing_license"))?;

        for record in self.records.iter_mut().filter(|r| r.is_missing_license()) {
            record.license.expressions = curated_license.to_vec();
            state.missing_license.push(MissingLicenseFix {
                file: record.path.clone(),
                curation: curated_license.to_vec(),
            });
        }
        info!(
            "curated missing license on {} files",
            state.missing_license.len()
        );

        state.cumulative.license = cumulative_license(&self.records);
        Ok(())
    }

    /// Set the license of every record whose path matches one of `files`.
    ///
    /// Paths match by substring, or by glob with [`FileMatcher::Glob`].
    pub fn curate_file_license(&mut self, files: &[String], curated_license: &str) -> Result<()> {
        let matcher = self.config.file_matcher;
        let state = self
            .state
            .as_mut()
            .ok_or(ScanReportError::NotFiltered("curate_file_license"))?;

        for curated_file in files {
            let pattern = PathPattern::new(matcher, curated_file)?;
            for record in self.records.iter_mut() {
                if !pattern.is_match(&record.path) {
                    continue;
                }
                let original = std::mem::replace(
                    &mut record.license.expressions,
                    vec![curated_license.to_string()],
                );
                debug!("{}: {:?} curated to {}", record.path, original, curated_license);
                state.curated_licenses.push(CuratedLicenseFix {
                    file: record.path.clone(),
                    curation: curated_license.to_string(),
                    original,
                });
            }
        }

        state.cumulative.license = cumulative_license(&self.records);
        Ok(())
    }

    /// The filtered report. Fails if no filters have been applied yet.
    pub fn report(&self) -> Result<FilterReport<'_>> {
        let state = self
            .state
            .as_ref()
            .ok_or(ScanReportError::NotFiltered("report"))?;
        Ok(FilterReport {
            files: self.select(&state.kept),
            fixes: self.fixes_of(state),
            meta: &self.meta,
            cumulative: &state.cumulative,
        })
    }

    /// Excluded files and curations.
    ///
    /// Without a prior `apply_filters` call, runs an unfiltered pass first:
    /// no filters and no default exclusions, so nothing is excluded.
    pub fn fixes(&mut self) -> Result<Fixes<'_>> {
        if self.state.is_none() {
            self.filter_records(&[], &[], false)?;
        }
        let state = self
            .state
            .as_ref()
            .ok_or(ScanReportError::NotFiltered("fixes"))?;
        Ok(self.fixes_of(state))
    }

    fn fixes_of<'a>(&'a self, state: &'a FilterState) -> Fixes<'a> {
        Fixes {
            excluded_files: self.select(&state.excluded),
            missing_license: &state.missing_license,
            curated_licenses: &state.curated_licenses,
        }
    }

    fn select(&self, indices: &[usize]) -> Vec<&FileRecord> {
        indices.iter().map(|&i| &self.records[i]).collect()
    }
}

fn compile_all(filters: &[ScanReportFilter], matcher: FileMatcher) -> Result<Vec<CompiledFilter>> {
    filters.iter().map(|f| f.compile(matcher)).collect()
}

/// True if any filter targets the file facet (`on_files`) or the
/// license/copyright facets (`!on_files`).
fn has_facet(filters: &[CompiledFilter], on_files: bool) -> bool {
    filters
        .iter()
        .any(|f| (f.kind() == FilterType::File) == on_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LicenseInfo;

    fn record(path: &str, expressions: &[&str], copyrights: &[&str]) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            content_hashes: Default::default(),
            copyrights: copyrights.iter().map(|s| s.to_string()).collect(),
            license: LicenseInfo {
                expressions: expressions.iter().map(|s| s.to_string()).collect(),
                matches: vec![],
            },
        }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(CanonicalReport {
            files: vec![
                record("cairo/src/cairo-xcb-surface.c", &["mit OR x11"], &["(c) 2009 Intel"]),
                record("cairo/src/cairo-xlib.c", &["x11-keith-packard"], &["(c) 2002 Keith Packard"]),
                record("cairo/test/xcb-test.c", &["lgpl-2.1"], &["(c) 2005 Jan Laar"]),
                record("cairo/util/show-events.c", &[], &[]),
                record("cairo/README", &[], &[]),
            ],
            meta: ReportMeta::default(),
        })
    }

    fn paths(report: &FilterReport<'_>) -> Vec<String> {
        report.files.iter().map(|f| f.path.clone()).collect()
    }

    #[test]
    fn test_no_filters_is_identity() {
        let mut a = analyzer();
        a.apply_filters(&[], &[]).unwrap();
        let report = a.report().unwrap();
        assert_eq!(report.files.len(), 5);
        assert!(report.fixes.excluded_files.is_empty());
    }

    #[test]
    fn test_missing_sentinel_only_for_survivors() {
        let mut a = analyzer();
        a.apply_filters(&[], &[ScanReportFilter::file("README")]).unwrap();
        let report = a.report().unwrap();
        let show = report.files.iter().find(|f| f.path.ends_with("show-events.c")).unwrap();
        assert_eq!(show.license.expressions, vec!["missing"]);
        let readme = report.fixes.excluded_files[0];
        assert!(readme.license.expressions.is_empty());
    }

    #[test]
    fn test_file_includes_are_ored() {
        let mut a = analyzer();
        a.apply_filters(&[ScanReportFilter::file("xlib"), ScanReportFilter::file("util/")], &[])
            .unwrap();
        assert_eq!(
            paths(&a.report().unwrap()),
            vec!["cairo/src/cairo-xlib.c", "cairo/util/show-events.c"]
        );
    }

    #[test]
    fn test_file_and_license_includes_are_anded() {
        let mut a = analyzer();
        a.apply_filters(&[ScanReportFilter::file("xcb"), ScanReportFilter::license("x11")], &[])
            .unwrap();
        assert_eq!(paths(&a.report().unwrap()), vec!["cairo/src/cairo-xcb-surface.c"]);
    }

    #[test]
    fn test_license_and_copyright_includes_are_ored() {
        let mut a = analyzer();
        a.apply_filters(
            &[ScanReportFilter::license("keith"), ScanReportFilter::copyright("Laar")],
            &[],
        )
        .unwrap();
        assert_eq!(
            paths(&a.report().unwrap()),
            vec!["cairo/src/cairo-xlib.c", "cairo/test/xcb-test.c"]
        );
    }

    #[test]
    fn test_excluded_in_removal_order_without_duplicates() {
        let mut a = analyzer();
        a.apply_filters(
            &[ScanReportFilter::file("cairo/src"), ScanReportFilter::file("cairo/test")],
            &[ScanReportFilter::file("xcb"), ScanReportFilter::license("x11")],
        )
        .unwrap();
        let report = a.report().unwrap();
        assert!(report.files.is_empty());
        let excluded: Vec<&str> = report.fixes.excluded_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            excluded,
            vec![
                "cairo/util/show-events.c",
                "cairo/README",
                "cairo/src/cairo-xcb-surface.c",
                "cairo/test/xcb-test.c",
                "cairo/src/cairo-xlib.c",
            ]
        );
    }

    #[test]
    fn test_missing_license_filter_matches_unnormalized() {
        let mut a = analyzer();
        a.apply_filters(&[ScanReportFilter::license("missing")], &[]).unwrap();
        assert_eq!(
            paths(&a.report().unwrap()),
            vec!["cairo/util/show-events.c", "cairo/README"]
        );
    }

    #[test]
    fn test_report_before_filtering_fails() {
        let a = analyzer();
        assert!(matches!(a.report(), Err(ScanReportError::NotFiltered("report"))));
    }

    #[test]
    fn test_curation_before_filtering_fails() {
        let mut a = analyzer();
        let err = a.curate_missing_license(&["mit".to_string()]).unwrap_err();
        assert!(matches!(err, ScanReportError::NotFiltered(_)));
        let err = a.curate_file_license(&["README".to_string()], "mit").unwrap_err();
        assert!(matches!(err, ScanReportError::NotFiltered(_)));
    }

    #[test]
    fn test_fixes_filters_lazily() {
        let mut a = analyzer();
        let fixes = a.fixes().unwrap();
        assert!(fixes.excluded_files.is_empty());
        assert!(a.report().is_ok());
    }

    #[test]
    fn test_curate_missing_license() {
        let mut a = analyzer();
        a.apply_filters(&[], &[]).unwrap();
        a.curate_missing_license(&["mit".to_string()]).unwrap();
        let report = a.report().unwrap();
        assert_eq!(report.fixes.missing_license.len(), 2);
        assert_eq!(report.fixes.missing_license[0].file, "cairo/util/show-events.c");
        assert!(report.files.iter().all(|f| !f.is_missing_license()));
    }

    #[test]
    fn test_curate_missing_license_reaches_excluded_files() {
        let mut a = analyzer();
        // README gets the sentinel on the first pass, then is excluded on the second
        a.apply_filters(&[], &[]).unwrap();
        a.apply_filters(&[], &[ScanReportFilter::file("README")]).unwrap();
        a.curate_missing_license(&["mit".to_string()]).unwrap();
        let report = a.report().unwrap();
        assert_eq!(report.fixes.excluded_files[0].license.expressions, vec!["mit"]);
        assert_eq!(report.fixes.missing_license.len(), 2);
    }

    #[test]
    fn test_curate_file_license() {
        let mut a = analyzer();
        a.apply_filters(&[], &[]).unwrap();
        a.curate_file_license(&["xlib".to_string(), "README".to_string()], "bsd-new")
            .unwrap();
        let report = a.report().unwrap();
        let curated = report.fixes.curated_licenses;
        assert_eq!(curated.len(), 2);
        assert_eq!(curated[0].file, "cairo/src/cairo-xlib.c");
        assert_eq!(curated[0].original, vec!["x11-keith-packard"]);
        assert_eq!(curated[1].original, vec!["missing"]);
        assert!(report.cumulative.license.as_deref().unwrap().contains("bsd-new"));
    }

    #[test]
    fn test_reapplying_filters_drops_curation_log() {
        let mut a = analyzer();
        a.apply_filters(&[], &[]).unwrap();
        a.curate_missing_license(&["mit".to_string()]).unwrap();
        a.apply_filters(&[], &[]).unwrap();
        let report = a.report().unwrap();
        assert!(report.fixes.missing_license.is_empty());
        // the curated value itself survives
        assert!(report.files.iter().all(|f| !f.is_missing_license()));
    }

    #[test]
    fn test_empty_curation_rejected() {
        let mut a = analyzer();
        a.apply_filters(&[], &[]).unwrap();
        assert!(matches!(
            a.curate_missing_license(&[]),
            Err(ScanReportError::InvalidCuration(_))
        ));
    }

    #[test]
    fn test_default_excludes_from_config() {
        let mut a = Analyzer::with_config(
            analyzer_report(),
            AnalyzerConfig {
                file_matcher: FileMatcher::Regex,
                default_excludes: vec!["README$".to_string()],
            },
        );
        a.apply_filters(&[], &[]).unwrap();
        assert_eq!(a.report().unwrap().files.len(), 4);
    }

    #[test]
    fn test_lazy_fixes_skip_default_excludes() {
        let mut a = Analyzer::with_config(
            analyzer_report(),
            AnalyzerConfig {
                file_matcher: FileMatcher::Regex,
                default_excludes: vec!["README$".to_string()],
            },
        );
        assert!(a.fixes().unwrap().excluded_files.is_empty());
        assert_eq!(a.report().unwrap().files.len(), 5);
    }

    #[test]
    fn test_glob_matcher() {
        let mut a = Analyzer::with_config(
            analyzer_report(),
            AnalyzerConfig {
                file_matcher: FileMatcher::Glob,
                default_excludes: vec![],
            },
        );
        a.apply_filters(&[ScanReportFilter::file("cairo/src/*.c")], &[]).unwrap();
        assert_eq!(a.report().unwrap().files.len(), 2);
        a.curate_file_license(&["*/README".to_string()], "mit").unwrap();
        assert_eq!(a.report().unwrap().fixes.curated_licenses.len(), 1);
    }

    #[test]
    fn test_cumulative_over_survivors() {
        let mut a = analyzer();
        a.apply_filters(&[ScanReportFilter::file("cairo/src")], &[]).unwrap();
        assert_eq!(
            a.report().unwrap().cumulative.license.as_deref(),
            Some("x11-keith-packard AND (mit OR x11)")
        );
    }

    fn analyzer_report() -> CanonicalReport {
        let a = analyzer();
        CanonicalReport {
            files: a.records,
            meta: a.meta,
        }
    }
}
