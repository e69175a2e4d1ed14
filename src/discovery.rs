//! Discovery coordinator
//!
//! Turns a sorted list of files into a [`ModuleMap`] and a populated
//! [`SymbolRegistry`] in three phases:
//!
//! 1. Serially stat every file and probe the [`DepsCache`].
//! 2. Read and run the discoverer on cache misses in parallel (rayon).
//! 3. Serially merge in path order: register provides, insert the record,
//!    store fresh facts in the cache.
//!
//! Workers never touch the registry or the cache. All mutation happens in
//! phases 1 and 3 on the calling thread, so the duplicate-provider check
//! and the error reported for a broken tree do not depend on scheduling.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::SystemTime;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::deps_cache::DepsCache;
use crate::error::{DepsError, Result};
use crate::fs_utils::file_mtime;
use crate::module::{ModuleMap, ModuleRecord};
use crate::patterns::{Declarations, Discover};
use crate::registry::SymbolRegistry;

/// Progress callback receiving (processed, total)
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// How a discovery pass was satisfied
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Files visited
    pub files: usize,
    /// Files answered from the cache
    pub cache_hits: usize,
    /// Files read and run through the discoverer
    pub parsed: usize,
}

struct Visited {
    path: PathBuf,
    mtime: SystemTime,
    decls: Declarations,
    fresh: bool,
}

/// Borrowed collaborators of one discovery pass
pub struct Discovery<'a> {
    discoverer: &'a dyn Discover,
    cancel: &'a AtomicBool,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> Discovery<'a> {
    pub fn new(discoverer: &'a dyn Discover, cancel: &'a AtomicBool) -> Self {
        Self {
            discoverer,
            cancel,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Discover `files` into `modules`, registering provides in `registry`
    ///
    /// `files` must be sorted; the merge follows their order.
    pub fn run(
        &self,
        files: &[PathBuf],
        cache: &mut DepsCache,
        registry: &mut SymbolRegistry,
        modules: &mut ModuleMap,
    ) -> Result<DiscoveryStats> {
        let total = files.len();

        // Phase 1: cache probe
        let mut slots: Vec<Option<Visited>> = Vec::with_capacity(total);
        let mut misses: Vec<(usize, &PathBuf, SystemTime)> = Vec::new();
        for (idx, path) in files.iter().enumerate() {
            let mtime = file_mtime(path).map_err(|e| DepsError::io(path, e))?;
            match cache.get(path, mtime) {
                Some(cached) => slots.push(Some(Visited {
                    path: path.clone(),
                    mtime,
                    decls: Declarations {
                        provides: cached.provides,
                        requires: cached.requires,
                    },
                    fresh: false,
                })),
                None => {
                    slots.push(None);
                    misses.push((idx, path, mtime));
                }
            }
        }
        let cache_hits = total - misses.len();
        debug!(total, cache_hits, "probed deps cache");
        self.check_cancelled()?;

        // Phase 2: parallel discovery of misses
        let processed = AtomicUsize::new(cache_hits);
        let parsed: Vec<(usize, Result<Visited>)> = misses
            .par_iter()
            .map(|&(idx, path, mtime)| {
                let result = self.discover_one(path, mtime);
                let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(cb) = self.progress {
                    if current % 50 == 0 {
                        cb(current, total);
                    }
                }
                (idx, result)
            })
            .collect();

        if let Some(cb) = self.progress {
            cb(total, total);
        }

        // First failure in path order wins
        for (idx, result) in parsed {
            slots[idx] = Some(result?);
        }
        self.check_cancelled()?;

        // Phase 3: serial merge
        for visited in slots.into_iter().flatten() {
            registry.add_all(&visited.decls.provides, &visited.path)?;

            let mut record =
                ModuleRecord::new(visited.path.clone(), visited.decls.provides.clone(), visited.mtime);
            record.set_requires(visited.decls.requires.iter().cloned());
            modules.insert(record);

            if visited.fresh {
                cache.put(&visited.path, visited.decls.requires, visited.decls.provides);
            }
        }

        let stats = DiscoveryStats {
            files: total,
            cache_hits,
            parsed: total - cache_hits,
        };
        info!(
            files = stats.files,
            cache_hits = stats.cache_hits,
            parsed = stats.parsed,
            discoverer = self.discoverer.name(),
            "discovered modules"
        );
        Ok(stats)
    }

    fn discover_one(&self, path: &Path, mtime: SystemTime) -> Result<Visited> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(DepsError::Cancelled);
        }
        let bytes = fs::read(path).map_err(|e| DepsError::io(path, e))?;
        let source = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = source {
            debug!(path = %path.display(), "replaced invalid UTF-8 while reading");
        }
        let decls = self.discoverer.discover(path, &source)?;
        Ok(Visited {
            path: path.to_path_buf(),
            mtime,
            decls,
            fresh: true,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(DepsError::Cancelled)
        } else {
            Ok(())
        }
    }
}
