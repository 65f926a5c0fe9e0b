//! File filtering and exclusion configuration.
//!
//! Filtering rules are loaded from a TOML file and decide which files an
//! organization run touches at all. Supported strategies:
//! - Exact filename matching
//! - Glob pattern matching
//! - File extension matching
//! - Regex pattern matching
//! - Include (whitelist) rules that override exclude rules
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Filtering rules deserialized from a TOML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub filters: FilterRules,
}

/// Root-level filter rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g. ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g. "*.tmp", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g. "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Whitelist rules that override exclusions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when provided
    /// 2. `.dupesortrc.toml` in the current directory
    /// 3. `~/.config/dupesort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error only when an explicitly provided or discovered
    /// configuration file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dupesortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dupesort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Compile the rules into matchers, validating every pattern up front.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filters: FilterRules {
                enable_hidden_files: false,
                exclude: ExcludeRules::default(),
                include: IncludeRules::default(),
            },
        }
    }
}

/// Pre-compiled filter matchers.
///
/// Glob and regex patterns are parsed once at load time so per-file
/// matching never reparses a pattern.
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check whether a file should be part of the run.
    ///
    /// Checks run in this order, with early termination:
    /// 1. Include patterns (whitelist) override everything
    /// 2. Hidden-file filter
    /// 3. Exact filename match
    /// 4. Extension match
    /// 5. Glob pattern match
    /// 6. Regex pattern match
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, file_path) {
            return false;
        }

        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        true
    }

    fn matches_any(&self, patterns: &[Pattern], file_path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_excludes(exclude: ExcludeRules) -> FilterConfig {
        FilterConfig {
            filters: FilterRules {
                enable_hidden_files: true,
                exclude,
                include: IncludeRules::default(),
            },
        }
    }

    #[test]
    fn test_default_config_hides_hidden_files() {
        let config = FilterConfig::default();
        assert!(!config.filters.enable_hidden_files);

        let compiled = config.compile().unwrap();
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new(".gitignore")));
        assert!(compiled.should_include(Path::new("report.pdf")));
    }

    #[test]
    fn test_hidden_files_included_when_enabled() {
        let config = config_with_excludes(ExcludeRules::default());
        let compiled = config.compile().unwrap();
        assert!(compiled.should_include(Path::new(".DS_Store")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let config = config_with_excludes(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        });
        let compiled = config.compile().unwrap();

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let config = config_with_excludes(ExcludeRules {
            extensions: vec!["bak".to_string(), "tmp".to_string()],
            ..Default::default()
        });
        let compiled = config.compile().unwrap();

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns_respect_directory_boundaries() {
        let config = config_with_excludes(ExcludeRules {
            patterns: vec!["**/logs/**".to_string()],
            ..Default::default()
        });
        let compiled = config.compile().unwrap();

        assert!(!compiled.should_include(Path::new("logs/file.txt")));
        assert!(!compiled.should_include(Path::new("app/logs/file.txt")));
        assert!(compiled.should_include(Path::new("my_logs/file.txt")));
    }

    #[test]
    fn test_exclude_regex() {
        let config = config_with_excludes(ExcludeRules {
            regex: vec![r"^draft_.*\.txt$".to_string()],
            ..Default::default()
        });
        let compiled = config.compile().unwrap();

        assert!(!compiled.should_include(Path::new("draft_notes.txt")));
        assert!(compiled.should_include(Path::new("notes.txt")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let config = FilterConfig {
            filters: FilterRules {
                enable_hidden_files: false,
                exclude: ExcludeRules::default(),
                include: IncludeRules {
                    patterns: vec![".important".to_string()],
                },
            },
        };
        let compiled = config.compile().unwrap();

        assert!(compiled.should_include(Path::new(".important")));
        assert!(!compiled.should_include(Path::new(".other")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let config = config_with_excludes(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        });
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let config = config_with_excludes(ExcludeRules {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        });
        assert!(config.compile().is_err());
    }
}
