//! closure-deps configuration
//!
//! Read from `--config <file>` or `./closure-deps.toml`:
//!
//! ```toml
//! [resolve]
//! roots = ["js/src"]
//! exclude = "/test/|/vendor/"
//! pattern = "closure"
//! entries_only = false
//!
//! [[resolve.calls]]
//! callee = "camp.using"
//! role = "require"
//!
//! [cache]
//! path = ".cache/deps.json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Relative paths in the file are taken relative to the file's directory.
//! Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cli::ResolveArgs;
use crate::deps_cache::CacheMode;
use crate::error::{DepsError, Result};
use crate::fs_utils::default_cache_path;
use crate::patterns::{CallRule, PatternKind};
use crate::walk::DEFAULT_INCLUDE;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "closure-deps.toml";

/// closure-deps configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DepsConfig {
    /// What to scan and how to read it
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveConfig {
    /// Directories or files to scan
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Regex of absolute paths to skip
    #[serde(default)]
    pub exclude: Option<String>,

    /// Regex of absolute paths to scan
    #[serde(default = "default_include")]
    pub include: String,

    /// Declaration style
    #[serde(default)]
    pub pattern: PatternKind,

    /// Extra call rules
    #[serde(default)]
    pub calls: Vec<CallRule>,

    /// Report only files that provide nothing
    #[serde(default)]
    pub entries_only: bool,
}

fn default_include() -> String {
    DEFAULT_INCLUDE.to_string()
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            exclude: None,
            include: default_include(),
            pattern: PatternKind::default(),
            calls: Vec::new(),
            entries_only: false,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheConfig {
    /// Cache file; derived from the roots when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Never read or write a cache file
    #[serde(default)]
    pub in_memory: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DepsConfig {
    /// Load `./closure-deps.toml`, or defaults when there is none
    pub fn load_default() -> Result<Self> {
        Self::load_optional(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load `path` if it exists, defaults otherwise
    fn load_optional(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file the caller named; it must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DepsError::ConfigError {
                message: format!("config file not found: {}", path.display()),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| DepsError::io(path, e))?;
        let mut config: Self = toml::from_str(&content).map_err(|e| DepsError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Make relative paths relative to `base`
    fn rebase(&mut self, base: &Path) {
        for root in &mut self.resolve.roots {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        if let Some(cache) = &mut self.cache.path {
            if cache.is_relative() {
                *cache = base.join(&*cache);
            }
        }
    }

    /// Override file values with command-line flags
    pub fn merge_args(&mut self, args: &ResolveArgs) {
        if !args.roots.is_empty() {
            self.resolve.roots = args.roots.clone();
        }
        if let Some(exclude) = &args.exclude {
            self.resolve.exclude = Some(exclude.clone());
        }
        if let Some(include) = &args.include {
            self.resolve.include = include.clone();
        }
        if let Some(pattern) = args.pattern {
            self.resolve.pattern = pattern;
        }
        if args.entries {
            self.resolve.entries_only = true;
        }
        if let Some(cache) = &args.cache {
            self.cache.path = Some(cache.clone());
            self.cache.in_memory = false;
        }
        if args.in_memory_cache {
            self.cache.in_memory = true;
        }
    }

    /// Check the settings a resolution run cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.resolve.roots.is_empty() {
            return Err(DepsError::ConfigError {
                message: "no roots given (pass ROOT arguments or set resolve.roots)".to_string(),
            });
        }
        self.include_regex()?;
        self.exclude_regex()?;
        for rule in &self.resolve.calls {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn include_regex(&self) -> Result<Regex> {
        compile_regex(&self.resolve.include)
    }

    pub fn exclude_regex(&self) -> Result<Option<Regex>> {
        self.resolve.exclude.as_deref().map(compile_regex).transpose()
    }

    /// Where the cache lives for this configuration
    ///
    /// `fingerprint` identifies the discoverer; the default location differs
    /// per fingerprint so pattern families never share cached facts.
    pub fn cache_mode(&self, fingerprint: &str) -> CacheMode {
        if self.cache.in_memory {
            return CacheMode::InMemory;
        }
        match &self.cache.path {
            Some(path) => CacheMode::Durable(path.clone()),
            None => CacheMode::Durable(default_cache_path(&self.resolve.roots, fingerprint)),
        }
    }
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DepsError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Role;

    #[test]
    fn test_missing_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DepsConfig::load_optional(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, DepsConfig::default());
        assert_eq!(config.resolve.include, DEFAULT_INCLUDE);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_named_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DepsConfig::load_from(&dir.path().join("typo.toml")).unwrap_err();
        assert!(matches!(
            err,
            DepsError::ConfigError { ref message } if message.contains("typo.toml")
        ));
    }

    #[test]
    fn test_load_full_file_rebases_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closure-deps.toml");
        fs::write(
            &path,
            r#"
            [resolve]
            roots = ["js", "/abs/lib"]
            exclude = "/test/"
            pattern = "amd"
            entries_only = true

            [[resolve.calls]]
            callee = "camp.using"
            role = "require"

            [cache]
            path = "cache/deps.json"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let config = DepsConfig::load_from(&path).unwrap();
        assert_eq!(
            config.resolve.roots,
            vec![dir.path().join("js"), PathBuf::from("/abs/lib")]
        );
        assert_eq!(config.resolve.pattern, PatternKind::Amd);
        assert!(config.resolve.entries_only);
        assert_eq!(config.resolve.calls, vec![CallRule::new("camp.using", Role::Require)]);
        assert_eq!(
            config.cache_mode("amd"),
            CacheMode::Durable(dir.path().join("cache/deps.json"))
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[resolve\nroots = 1").unwrap();
        assert!(matches!(
            DepsConfig::load_from(&path),
            Err(DepsError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_args_override_file_values() {
        let mut config = DepsConfig::default();
        config.resolve.roots = vec![PathBuf::from("/from/file")];
        config.cache.in_memory = true;

        config.merge_args(&ResolveArgs {
            roots: vec![PathBuf::from("/from/cli")],
            pattern: Some(PatternKind::Regex),
            cache: Some(PathBuf::from("/tmp/c.json")),
            ..Default::default()
        });

        assert_eq!(config.resolve.roots, vec![PathBuf::from("/from/cli")]);
        assert_eq!(config.resolve.pattern, PatternKind::Regex);
        assert_eq!(
            config.cache_mode("regex"),
            CacheMode::Durable(PathBuf::from("/tmp/c.json"))
        );
    }

    #[test]
    fn test_validate() {
        let mut config = DepsConfig::default();
        assert!(matches!(config.validate(), Err(DepsError::ConfigError { .. })));

        config.resolve.roots = vec![PathBuf::from(".")];
        assert!(config.validate().is_ok());

        config.resolve.exclude = Some("(".to_string());
        assert!(matches!(config.validate(), Err(DepsError::InvalidPattern { .. })));
    }

    #[test]
    fn test_default_cache_mode_uses_roots() {
        let mut config = DepsConfig::default();
        config.resolve.roots = vec![PathBuf::from("/repo")];
        assert_eq!(
            config.cache_mode("closure"),
            CacheMode::Durable(default_cache_path(&[PathBuf::from("/repo")], "closure"))
        );
        assert_ne!(config.cache_mode("closure"), config.cache_mode("amd"));
    }
}
