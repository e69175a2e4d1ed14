//! Command modules for the closure-deps CLI
//!
//! Each command module implements a single top-level command:
//! - `resolve` - Print every file's ordered dependency closure
//! - `deps` - Generate deps.js
//! - `cache` - Inspect or delete a cache file
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext` for output format and verbosity.

pub mod cache;
pub mod deps;
pub mod resolve;

pub use cache::run_cache;
pub use deps::run_deps;
pub use resolve::run_resolve;

use std::path::{Path, PathBuf};

use crate::cli::{OutputFormat, ResolveArgs};
use crate::config::DepsConfig;
use crate::engine::DepsEngine;
use crate::error::{DepsError, Result};

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    /// Show progress during long operations
    pub progress: bool,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
}

impl CommandContext {
    /// Create a new CommandContext from CLI args
    pub fn from_cli(
        format: OutputFormat,
        verbose: bool,
        progress: bool,
        config: Option<PathBuf>,
    ) -> Self {
        Self {
            format,
            verbose,
            progress,
            config,
        }
    }

    /// Configuration file values with `args` applied on top
    pub fn load_config(&self, args: &ResolveArgs) -> Result<DepsConfig> {
        let mut config = match &self.config {
            Some(path) => DepsConfig::load_from(path)?,
            None => DepsConfig::load_default()?,
        };
        config.merge_args(args);
        Ok(config)
    }

    /// Engine for `args`, reporting progress on stderr when asked to
    pub fn engine(&self, args: &ResolveArgs) -> Result<DepsEngine> {
        let engine = DepsEngine::new(self.load_config(args)?)?;
        if !self.progress {
            return Ok(engine);
        }
        Ok(engine.with_progress(Box::new(|current, total| {
            let percent = if total == 0 {
                100.0
            } else {
                (current as f64 / total as f64) * 100.0
            };
            eprintln!("Progress: {}/{} ({:.0}%)", current, total, percent);
        })))
    }
}

/// Pretty JSON for command output
pub(crate) fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| DepsError::ConfigError {
        message: format!("JSON serialization failed: {}", e),
    })
}

/// Base directory output paths are shown relative to
pub(crate) fn display_base(roots: &[PathBuf]) -> PathBuf {
    let first = roots.first().map(PathBuf::as_path).unwrap_or(Path::new("."));
    let base = crate::fs_utils::normalize_path(first);
    if base.is_file() {
        base.parent().map(Path::to_path_buf).unwrap_or(base)
    } else {
        base
    }
}
