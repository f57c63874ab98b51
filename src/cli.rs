use std::path::PathBuf;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use scarfer::filter::FileMatcher;
use scarfer::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "scarfer",
    about = "Source code scan report reader: outputs selected information about filtered files",
    after_help = "SUPPORTED SCAN REPORT FORMATS\n   * ScanCode output format 1.0.0 and unversioned output\n   * ScanCode output format 2.0.0, 3.0.x, 3.2.x and 4.0.x",
    version
)]
pub struct Cli {
    /// Scan report to use
    pub file: Option<PathBuf>,

    /// Quit after scan report normalization and output the result
    #[arg(long)]
    pub normalize: bool,

    /// Output information about license matches
    #[arg(short = 'm', long)]
    pub matched_text: bool,

    /// Output information about copyrights
    #[arg(short, long)]
    pub copyrights: bool,

    /// Output cumulative license information
    #[arg(long)]
    pub cumulative: bool,

    /// Output information about license
    #[arg(short, long)]
    pub license: bool,

    /// Output license summary
    #[arg(long)]
    pub license_summary: bool,

    /// Output copyright summary
    #[arg(long)]
    pub copyright_summary: bool,

    /// Filter on licenses containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub include_license: Vec<String>,

    /// Filter out licenses containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub exclude_license: Vec<String>,

    /// Filter on copyrights containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub include_copyright: Vec<String>,

    /// Filter out copyrights containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub exclude_copyright: Vec<String>,

    /// Filter on files containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub include_file: Vec<String>,

    /// Filter out files containing argument
    #[arg(long, value_name = "EXPR", num_args = 1.., action = ArgAction::Append)]
    pub exclude_file: Vec<String>,

    /// Filter on files listed in the given filter files
    #[arg(long, value_name = "FILE", num_args = 1.., action = ArgAction::Append)]
    pub include_file_file: Vec<PathBuf>,

    /// Filter out files listed in the given filter files
    #[arg(long, value_name = "FILE", num_args = 1.., action = ArgAction::Append)]
    pub exclude_file_file: Vec<PathBuf>,

    /// Disable the default file exclusions
    #[arg(long)]
    pub disable_default_excludes: bool,

    /// Replace the built-in default exclusions with rules read from FILE
    #[arg(long, value_name = "FILE")]
    pub default_excludes: Option<PathBuf>,

    /// Curate missing license with the given license (repeatable)
    #[arg(long, value_name = "LICENSE", action = ArgAction::Append)]
    pub curate_missing_license: Vec<String>,

    /// Curate license for files: FILE [FILE..] LICENSE (repeatable)
    #[arg(
        id = "curate_file_license",
        long = "curate-file-license",
        value_name = "FILE.. LICENSE",
        num_args = 2..,
        action = ArgAction::Append
    )]
    curate_file_license_values: Vec<String>,

    /// `--curate-file-license` values, one group per occurrence.
    #[arg(skip)]
    pub curate_file_license: Vec<Vec<String>>,

    /// How file filters are matched against paths
    #[arg(long, value_name = "MATCHER")]
    pub file_matcher: Option<FileMatcher>,

    /// Output format [default: text]
    #[arg(short, long, value_name = "FORMAT", ignore_case = true)]
    pub format: Option<OutputFormat>,

    /// Output files filtered out and curations
    #[arg(long)]
    pub output_fixes: bool,

    /// Output the merged configuration as TOML and exit
    #[arg(long)]
    pub output_config: bool,

    /// Configuration file [default: ./.scarfer/config.toml, fallback ~/.config/scarfer/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output verbose information to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse the process arguments, keeping `--curate-file-license` groups apart.
    pub fn parse_args() -> Self {
        Self::parse_args_from(std::env::args_os())
    }

    pub fn parse_args_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().get_matches_from(args);
        let mut cli = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        cli.curate_file_license = group_occurrences(&matches, &cli.curate_file_license_values);
        cli
    }
}

/// Split the flat values of `--curate-file-license` into one group per occurrence.
fn group_occurrences(matches: &ArgMatches, values: &[String]) -> Vec<Vec<String>> {
    let Some(occurrences) = matches.get_occurrences::<String>("curate_file_license") else {
        return Vec::new();
    };
    let mut rest = values;
    let mut groups = Vec::new();
    for occurrence in occurrences {
        let (group, tail) = rest.split_at(occurrence.count().min(rest.len()));
        groups.push(group.to_vec());
        rest = tail;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curate_file_license_groups() {
        let cli = Cli::parse_args_from([
            "scarfer",
            "scan.json",
            "--curate-file-license",
            "a.c",
            "b.c",
            "mit",
            "--curate-file-license",
            "util/",
            "gpl-2.0",
        ]);
        assert_eq!(
            cli.curate_file_license,
            vec![
                vec!["a.c".to_string(), "b.c".to_string(), "mit".to_string()],
                vec!["util/".to_string(), "gpl-2.0".to_string()],
            ]
        );
    }

    #[test]
    fn test_no_curate_file_license() {
        let cli = Cli::parse_args_from(["scarfer", "scan.json"]);
        assert!(cli.curate_file_license.is_empty());
    }

    #[test]
    fn test_curate_file_license_needs_two_values() {
        let matches = Cli::command().try_get_matches_from(["scarfer", "--curate-file-license", "mit"]);
        assert!(matches.is_err());
    }
}
