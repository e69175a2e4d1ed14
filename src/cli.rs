//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::patterns::PatternKind;

/// Incremental provide/require dependency resolver
#[derive(Parser, Debug)]
#[command(name = "closure-deps")]
#[command(about = "Resolve goog.provide/goog.require style dependencies into ordered closures")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./closure-deps.toml when present)
    #[arg(short, long, value_name = "FILE", env = "CLOSURE_DEPS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show progress percentage during long operations
    #[arg(long, global = true)]
    pub progress: bool,
}

/// Available subcommands for closure-deps
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve every file and print its ordered dependency closure
    #[command(visible_alias = "r")]
    Resolve(ResolveArgs),

    /// Generate goog.addDependency lines (deps.js)
    #[command(visible_alias = "d")]
    Deps(DepsArgs),

    /// Inspect or delete a dependency cache file
    Cache(CacheArgs),
}

/// Options shared by every command that runs a resolution
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Directories or files to scan
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Skip files whose absolute path matches this regex
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Only scan files whose absolute path matches this regex
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Declaration style to recognize
    #[arg(long, value_enum)]
    pub pattern: Option<PatternKind>,

    /// Only report entry files (files that provide nothing)
    #[arg(long)]
    pub entries: bool,

    /// Cache file location
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long, conflicts_with = "cache")]
    pub in_memory_cache: bool,
}

/// Arguments for the deps command
#[derive(Args, Debug)]
pub struct DepsArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Write deps.js here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory output paths are relative to (defaults to the output
    /// file's directory, or the first root)
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,
}

/// Arguments for the cache command
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub operation: CacheOperation,
}

/// Cache operations
#[derive(Subcommand, Debug)]
pub enum CacheOperation {
    /// Show cache location and contents summary
    Info(CacheTarget),

    /// Delete the cache file
    Clear(CacheTarget),
}

/// Which cache file a cache operation targets
#[derive(Args, Debug, Clone, Default)]
pub struct CacheTarget {
    /// Roots whose default cache file is meant
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Explicit cache file
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document
    Json,
}
