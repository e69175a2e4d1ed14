//! closure-deps: incremental provide/require dependency resolution
//!
//! Source files declare the names they provide (`goog.provide('a.b')`) and
//! the names they require (`goog.require('c.d')`). This crate turns those
//! declarations into a per-file, ordered closure of the files each one
//! transitively depends on, with every dependency before its dependents and
//! the file itself last.
//!
//! Runs are incremental: declarations discovered for a file are kept in a
//! JSON cache and reused while the file is older than the cache.
//!
//! # Layout
//!
//! - [`registry`], [`module`], [`resolver`], [`deps_cache`]: the resolution
//!   core (name ownership, graph nodes, closures, staleness cache)
//! - [`patterns`], [`parsing`], [`lang`]: reading declarations out of files
//! - [`walk`], [`discovery`], [`engine`]: running a pass over a file tree
//! - [`generator`]: deps.js output
//!
//! # Example
//!
//! ```no_run
//! use closure_deps::{DepsConfig, DepsEngine};
//! use std::path::PathBuf;
//!
//! let mut config = DepsConfig::default();
//! config.resolve.roots = vec![PathBuf::from("js")];
//!
//! let mut engine = DepsEngine::new(config)?;
//! for record in engine.resolve()?.iter() {
//!     println!("{}: {:?}", record.path().display(), record.resolved_dependencies());
//! }
//! # Ok::<(), closure_deps::DepsError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod deps_cache;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod fs_utils;
pub mod generator;
pub mod lang;
pub mod module;
pub mod parsing;
pub mod patterns;
pub mod registry;
pub mod resolver;
pub mod walk;

// Re-export commonly used types
pub use cli::{Cli, OutputFormat};
pub use config::DepsConfig;
pub use deps_cache::{CacheMode, CachedDeps, DepsCache};
pub use discovery::{DiscoveryStats, ProgressCallback};
pub use engine::{DepsEngine, RunStats};
pub use error::{DepsError, Result};
pub use generator::{generate_deps_js, write_deps_js};
pub use lang::Lang;
pub use module::{ModuleMap, ModuleRecord};
pub use patterns::{
    discoverer_for, CallRule, Declarations, Discover, PatternKind, PatternSet, RegexDiscoverer,
    Role, TreeSitterDiscoverer,
};
pub use registry::SymbolRegistry;
pub use resolver::{DependencyResolver, ResolveStats};
