//! Resolution runs
//!
//! [`DepsEngine`] owns everything that lives across runs (the cache, the
//! last resolved map, the discoverer) and drives one pass:
//!
//! ```text
//! begin cache generation -> walk roots -> discover -> resolve -> clear registry -> flush cache
//! ```
//!
//! A pass either completes and replaces the module map, or fails and leaves
//! the previous map in place. The cache is only flushed by a completed pass.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use crate::config::DepsConfig;
use crate::deps_cache::DepsCache;
use crate::discovery::{Discovery, DiscoveryStats, ProgressCallback};
use crate::error::{DepsError, Result};
use crate::fs_utils::normalize_path;
use crate::module::{ModuleMap, ModuleRecord};
use crate::patterns::{discoverer_for, Discover};
use crate::registry::SymbolRegistry;
use crate::resolver::{DependencyResolver, ResolveStats};
use crate::walk::for_each_file;

/// Counters of the last completed pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub discovery: DiscoveryStats,
    pub resolve: ResolveStats,
}

/// Incremental resolver over a fixed set of roots
pub struct DepsEngine {
    config: DepsConfig,
    include: Regex,
    exclude: Option<Regex>,
    discoverer: Box<dyn Discover>,
    cache: DepsCache,
    registry: SymbolRegistry,
    modules: ModuleMap,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
    last_run: Option<RunStats>,
}

impl DepsEngine {
    /// Engine using the discoverer selected by `config`
    pub fn new(config: DepsConfig) -> Result<Self> {
        let discoverer = discoverer_for(config.resolve.pattern, &config.resolve.calls)?;
        Self::with_discoverer(config, discoverer)
    }

    /// Engine using a caller-supplied discoverer
    pub fn with_discoverer(config: DepsConfig, discoverer: Box<dyn Discover>) -> Result<Self> {
        config.validate()?;
        let include = config.include_regex()?;
        let exclude = config.exclude_regex()?;
        let fingerprint = discoverer.fingerprint();
        let cache = DepsCache::load(config.cache_mode(&fingerprint), &fingerprint);

        Ok(Self {
            config,
            include,
            exclude,
            discoverer,
            cache,
            registry: SymbolRegistry::new(),
            modules: ModuleMap::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
            last_run: None,
        })
    }

    /// Report discovery progress as (processed, total)
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run one pass and return the resolved map
    pub fn resolve(&mut self) -> Result<&ModuleMap> {
        self.cache.begin_run();
        self.registry.clear();

        let outcome = self.run_pass();
        self.registry.clear();

        let (modules, stats) = match outcome {
            Ok(done) => done,
            Err(err) => {
                if matches!(err, DepsError::Cancelled) {
                    // The next pass starts uncancelled
                    self.cancel.store(false, Ordering::Relaxed);
                }
                warn!(error = %err, "resolution pass failed");
                return Err(err);
            }
        };

        self.cache.flush()?;
        info!(
            records = stats.resolve.records,
            cache_hits = stats.discovery.cache_hits,
            parsed = stats.discovery.parsed,
            "resolution pass complete"
        );
        self.modules = modules;
        self.last_run = Some(stats);
        Ok(&self.modules)
    }

    fn run_pass(&mut self) -> Result<(ModuleMap, RunStats)> {
        let files = for_each_file(&self.config.resolve.roots, self.exclude.as_ref(), &self.include)?;

        let mut modules = ModuleMap::new();
        let discovery = Discovery::new(self.discoverer.as_ref(), &self.cancel)
            .with_progress(self.progress.as_ref())
            .run(&files, &mut self.cache, &mut self.registry, &mut modules)?;

        let resolve = DependencyResolver::resolve_all(&mut modules, &self.registry)?;
        Ok((modules, RunStats { discovery, resolve }))
    }

    /// Records of the last pass that provide nothing
    pub fn entries(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.entries()
    }

    /// Records selected by `entries_only`
    pub fn selected(&self) -> ModuleMap {
        if self.config.resolve.entries_only {
            self.modules.entries_only()
        } else {
            self.modules.clone()
        }
    }

    /// Drop `path` from the graph and the cache
    ///
    /// The registry only holds names while a pass runs, so the removed
    /// record's provided names are already free: the next pass registers
    /// whatever file provides them then. Closures of other records still
    /// mention the path until that pass.
    pub fn remove(&mut self, path: &Path) -> Option<ModuleRecord> {
        let path = normalize_path(path);
        self.cache.remove(&path);
        let record = self.modules.remove(&path)?;
        info!(path = %path.display(), "removed module");
        Some(record)
    }

    /// Flag that aborts discovery of the running pass when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn modules(&self) -> &ModuleMap {
        &self.modules
    }

    pub fn config(&self) -> &DepsConfig {
        &self.config
    }

    pub fn cache(&self) -> &DepsCache {
        &self.cache
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// Counters of the last completed pass
    pub fn stats(&self) -> Option<&RunStats> {
        self.last_run.as_ref()
    }
}

impl std::fmt::Debug for DepsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepsEngine")
            .field("roots", &self.config.resolve.roots)
            .field("discoverer", &self.discoverer.name())
            .field("modules", &self.modules.len())
            .finish()
    }
}
