//! Persistent provides/requires cache
//!
//! Stores the declarations discovered for each file so that unchanged files
//! skip reading and parsing on the next run. The cache is a single JSON
//! document:
//!
//! ```json
//! { "version": "2", "discoverer": "closure", "files": { "/abs/a.js": { "requires": ["B"], "provides": ["A"] } } }
//! ```
//!
//! `discoverer` is the fingerprint of the discoverer that produced the
//! facts. A file written under another fingerprint is read as empty.
//!
//! # Staleness
//!
//! An entry is reused only when the cache file itself is newer than the
//! source file it describes. Every entry read or written during a run is
//! stamped with that run's generation marker; [`DepsCache::flush`] drops
//! everything not stamped, which bounds the cache to files that still exist
//! and were visited.
//!
//! Only one run should use a given cache path at a time. No lock is taken.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DepsError, Result};
use crate::fs_utils::{atomic_rename, normalize_path};

/// Cache schema version; any other version is read as an empty cache
pub const CACHE_VERSION: &str = "2";

/// Declarations remembered for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDeps {
    pub requires: Vec<String>,
    pub provides: Vec<String>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    deps: CachedDeps,
    generation: Uuid,
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: String,
    #[serde(default)]
    discoverer: String,
    #[serde(default)]
    files: BTreeMap<String, CachedDeps>,
}

/// Where the cache lives between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from and persist to this file
    Durable(PathBuf),
    /// Never touch the disk; entries live only as long as the process
    InMemory,
}

/// Run-scoped staleness cache keyed by absolute file path
#[derive(Debug)]
pub struct DepsCache {
    mode: CacheMode,
    fingerprint: String,
    entries: HashMap<PathBuf, CacheEntry>,
    generation: Uuid,
    /// Modification time of the cache file, or load time on a cold start
    mtime: SystemTime,
}

impl DepsCache {
    /// Load the cache for `mode` holding facts of the discoverer `fingerprint`
    ///
    /// A missing, unreadable, corrupt or version-mismatched file yields an
    /// empty cache, as does one written under another fingerprint; it is
    /// never an error.
    pub fn load(mode: CacheMode, fingerprint: &str) -> Self {
        let generation = Uuid::new_v4();
        let (entries, mtime) = match &mode {
            CacheMode::Durable(path) => read_document(path, fingerprint),
            CacheMode::InMemory => (HashMap::new(), SystemTime::now()),
        };

        debug!(entries = entries.len(), %generation, fingerprint, "loaded deps cache");
        Self {
            mode,
            fingerprint: fingerprint.to_string(),
            entries,
            generation,
            mtime,
        }
    }

    pub fn in_memory() -> Self {
        Self::load(CacheMode::InMemory, "")
    }

    pub fn mode(&self) -> &CacheMode {
        &self.mode
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    /// Time the cached facts were last persisted
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a new run: entries must be touched again to survive the next flush
    pub fn begin_run(&mut self) {
        self.generation = Uuid::new_v4();
    }

    /// Cached declarations for `path`, if still fresh
    ///
    /// A hit stamps the entry with the current generation. An entry whose
    /// source file is newer than the cache counts as a miss (it is still
    /// stamped; the caller is about to `put` fresh facts for it).
    pub fn get(&mut self, path: &Path, source_mtime: SystemTime) -> Option<CachedDeps> {
        let entry = self.entries.get_mut(&cache_key(path))?;
        entry.generation = self.generation;

        if self.mtime > source_mtime {
            Some(entry.deps.clone())
        } else {
            debug!(path = %path.display(), "stale cache entry");
            None
        }
    }

    /// Record freshly discovered declarations for `path`
    pub fn put(&mut self, path: &Path, requires: Vec<String>, provides: Vec<String>) {
        self.entries.insert(
            cache_key(path),
            CacheEntry {
                deps: CachedDeps { requires, provides },
                generation: self.generation,
            },
        );
    }

    /// Forget `path` (deleted or moved)
    pub fn remove(&mut self, path: &Path) -> Option<CachedDeps> {
        self.entries.remove(&cache_key(path)).map(|e| e.deps)
    }

    /// Drop entries not touched in this run, then persist the rest
    ///
    /// Must run once, after resolution: flushing earlier would discard facts
    /// for files not yet visited.
    pub fn flush(&mut self) -> Result<()> {
        let before = self.entries.len();
        let generation = self.generation;
        self.entries.retain(|_, e| e.generation == generation);
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!(pruned, "pruned untouched cache entries");
        }

        let CacheMode::Durable(path) = &self.mode else {
            self.mtime = SystemTime::now();
            return Ok(());
        };

        let document = CacheDocument {
            version: CACHE_VERSION.to_string(),
            discoverer: self.fingerprint.clone(),
            files: self
                .entries
                .iter()
                .map(|(p, e)| (p.to_string_lossy().into_owned(), e.deps.clone()))
                .collect(),
        };
        let content = serde_json::to_string(&document)
            .map_err(|e| DepsError::io(path.clone(), format!("Failed to serialize cache: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DepsError::io(parent, e))?;
            }
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| DepsError::io(tmp.clone(), e))?;
        atomic_rename(&tmp, path).map_err(|e| DepsError::io(path.clone(), e))?;

        self.mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());

        info!(
            entries = self.entries.len(),
            path = %path.display(),
            "persisted deps cache"
        );
        Ok(())
    }
}

fn cache_key(path: &Path) -> PathBuf {
    normalize_path(path)
}

fn read_document(path: &Path, fingerprint: &str) -> (HashMap<PathBuf, CacheEntry>, SystemTime) {
    let cold = || (HashMap::new(), SystemTime::now());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), "no usable cache file: {}", e);
            return cold();
        }
    };
    let document: CacheDocument = match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), "ignoring corrupt cache file: {}", e);
            return cold();
        }
    };
    if document.version != CACHE_VERSION {
        info!(
            found = %document.version,
            expected = CACHE_VERSION,
            "cache version mismatch, starting cold"
        );
        return cold();
    }
    if document.discoverer != fingerprint {
        info!(
            found = %document.discoverer,
            expected = fingerprint,
            "cache written by another discoverer, starting cold"
        );
        return cold();
    }

    let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => mtime,
        Err(_) => return cold(),
    };

    // Loaded entries belong to no run until touched.
    let entries = document
        .files
        .into_iter()
        .map(|(p, deps)| {
            (
                PathBuf::from(p),
                CacheEntry {
                    deps,
                    generation: Uuid::nil(),
                },
            )
        })
        .collect();
    (entries, mtime)
}
