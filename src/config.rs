//! Configuration file handling.
//!
//! A configuration file holds the same options as the command line. It is
//! TOML (`.toml`) or JSON (`.json`); list options are merged with the ones
//! given on the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use scarfer::filter::{parse_filter_rules, read_filter_file, FileMatcher, DEFAULT_EXCLUDE_RULES};

use crate::cli::Cli;

/// Options read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub include_license: Vec<String>,
    pub exclude_license: Vec<String>,
    pub include_copyright: Vec<String>,
    pub exclude_copyright: Vec<String>,
    pub include_file: Vec<String>,
    pub exclude_file: Vec<String>,
    pub include_file_file: Vec<PathBuf>,
    pub exclude_file_file: Vec<PathBuf>,
    pub disable_default_excludes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_excludes: Option<PathBuf>,
    pub curate_missing_license: Vec<String>,
    /// Groups of `[file.., license]`.
    pub curate_file_license: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_matcher: Option<FileMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `./.scarfer/config.toml`
/// 3. `~/.config/scarfer/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = Path::new(".scarfer").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("scarfer").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?
    } else {
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))?
    };
    Ok(config)
}

impl Config {
    /// Merge command line options into this configuration.
    ///
    /// Lists are concatenated (configuration first), flags are OR'd and
    /// single values given on the command line win.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if cli.file.is_some() {
            self.file = cli.file.clone();
        }
        self.include_license.extend(cli.include_license.iter().cloned());
        self.exclude_license.extend(cli.exclude_license.iter().cloned());
        self.include_copyright.extend(cli.include_copyright.iter().cloned());
        self.exclude_copyright.extend(cli.exclude_copyright.iter().cloned());
        self.include_file.extend(cli.include_file.iter().cloned());
        self.exclude_file.extend(cli.exclude_file.iter().cloned());
        self.include_file_file.extend(cli.include_file_file.iter().cloned());
        self.exclude_file_file.extend(cli.exclude_file_file.iter().cloned());
        self.disable_default_excludes |= cli.disable_default_excludes;
        if cli.default_excludes.is_some() {
            self.default_excludes = cli.default_excludes.clone();
        }
        self.curate_missing_license.extend(cli.curate_missing_license.iter().cloned());
        self.curate_file_license.extend(cli.curate_file_license.iter().cloned());
        if cli.file_matcher.is_some() {
            self.file_matcher = cli.file_matcher;
        }
        if let Some(value) = cli.format.and_then(|f| f.to_possible_value()) {
            self.format = Some(value.get_name().to_string());
        }
        self
    }

    /// Include file rules: `include_file` plus the rules of every `include_file_file`.
    pub fn include_file_rules(&self) -> Result<Vec<String>> {
        merge_file_filters(&self.include_file, &self.include_file_file)
    }

    /// Exclude file rules: `exclude_file` plus the rules of every `exclude_file_file`.
    pub fn exclude_file_rules(&self) -> Result<Vec<String>> {
        merge_file_filters(&self.exclude_file, &self.exclude_file_file)
    }

    /// The default exclusion rules handed to the analyzer, empty when disabled.
    pub fn default_exclude_rules(&self) -> Result<Vec<String>> {
        if self.disable_default_excludes {
            return Ok(Vec::new());
        }
        match &self.default_excludes {
            Some(path) => Ok(read_filter_file(path)?),
            None => Ok(parse_filter_rules(DEFAULT_EXCLUDE_RULES)),
        }
    }

    /// Split `curate_file_license` groups into (files, license).
    pub fn file_curations(&self) -> Result<Vec<(Vec<String>, String)>> {
        self.curate_file_license
            .iter()
            .map(|group| match group.split_last() {
                Some((license, files)) if !files.is_empty() => {
                    Ok((files.to_vec(), license.clone()))
                }
                _ => anyhow::bail!(
                    "curate_file_license needs at least one file and a license, got {:?}",
                    group
                ),
            })
            .collect()
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

fn merge_file_filters(rules: &[String], rule_files: &[PathBuf]) -> Result<Vec<String>> {
    let mut merged = rules.to_vec();
    for path in rule_files {
        merged.extend(read_filter_file(path)?);
    }
    Ok(merged)
}
