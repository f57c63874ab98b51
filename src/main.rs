//! `scarfer`: read a scan report, filter and curate it, and print the result.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and merge them with the config file ([`config`]).
//! 2. Read and normalize the scan report.
//! 3. Build include/exclude filters and apply them.
//! 4. Apply curations.
//! 5. Render the requested view with the selected formatter.

mod cli;
mod config;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use scarfer::filter::create_filters;
use scarfer::report::{self, Settings};
use scarfer::{reader, Analyzer, AnalyzerConfig, ScanReportReader};

use cli::Cli;
use config::load_config;

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?.merge_cli(&cli);

    if cli.output_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let file = config
        .file
        .clone()
        .context("no scan report given (argument FILE or `file` in the config file)")?;

    let format_name = config.format.as_deref().unwrap_or("text");
    let formatter = report::formatter(format_name)
        .with_context(|| format!("unsupported output format '{}'", format_name))?;

    // Read and normalize the scan report
    let reader = ScanReportReader::new(&file);
    let normalized = reader.read()?;

    if cli.normalize {
        reader::validate(&normalized)?;
        println!("{}", serde_json::to_string_pretty(&normalized)?);
        return Ok(());
    }

    if cli.verbose {
        eprintln!(
            "  {} {} {} files ({} {})",
            "→".cyan(),
            file.display(),
            normalized.files.len(),
            normalized.meta.scanner.tool_name,
            normalized.meta.scanner.tool_version
        );
    }

    // Filters
    let filters = create_filters(
        &config.include_license,
        &config.include_copyright,
        &config.include_file_rules()?,
    );
    let exclude_filters = create_filters(
        &config.exclude_license,
        &config.exclude_copyright,
        &config.exclude_file_rules()?,
    );

    let mut analyzer = Analyzer::with_config(
        normalized,
        AnalyzerConfig {
            file_matcher: config.file_matcher.unwrap_or_default(),
            default_excludes: config.default_exclude_rules()?,
        },
    );
    analyzer.apply_filters(&filters, &exclude_filters)?;

    // Curations
    if !config.curate_missing_license.is_empty() {
        analyzer.curate_missing_license(&config.curate_missing_license)?;
    }
    for (files, license) in config.file_curations()? {
        analyzer.curate_file_license(&files, &license)?;
    }

    let settings = Settings {
        copyrights: cli.copyrights,
        licenses: cli.license,
        matches: cli.matched_text,
    };

    let output = if cli.copyright_summary || cli.license_summary {
        let report = analyzer.report()?;
        let mut parts = Vec::new();
        if cli.copyright_summary {
            parts.push(formatter.format_copyright_summary(&report)?);
        }
        if cli.license_summary {
            parts.push(formatter.format_license_summary(&report)?);
        }
        parts.join("\n")
    } else if cli.cumulative {
        formatter.format_cumulative(&analyzer.report()?)?
    } else if cli.output_fixes {
        formatter.format_fixes(&analyzer.fixes()?)?
    } else {
        formatter.format(&analyzer.report()?, &settings)?
    };

    println!("{}", output);

    if cli.verbose {
        let fixes = analyzer.fixes()?;
        eprintln!(
            "  {} {} excluded, {} missing licenses curated, {} licenses curated",
            "→".cyan(),
            fixes.excluded_files.len(),
            fixes.missing_license.len(),
            fixes.curated_licenses.len()
        );
    }

    Ok(())
}
