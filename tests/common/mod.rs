//! Common test utilities and fixtures for closure-deps integration tests
//!
//! This module provides:
//! - `TestRepo` builder for creating source trees with controlled mtimes
//! - `CountingDiscoverer` for observing which files were re-read

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod test_repo;

pub use test_repo::{rel_paths, TestRepo};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use closure_deps::{Declarations, Discover, PatternSet, TreeSitterDiscoverer};

/// Closure Library discoverer that records every file it is asked about
pub struct CountingDiscoverer {
    inner: TreeSitterDiscoverer,
    seen: Arc<Mutex<Vec<PathBuf>>>,
}

impl CountingDiscoverer {
    pub fn new() -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner: TreeSitterDiscoverer::new(PatternSet::closure()),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl Discover for CountingDiscoverer {
    fn name(&self) -> &str {
        "counting"
    }

    fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }

    fn discover(&self, path: &Path, source: &str) -> closure_deps::Result<Declarations> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        self.inner.discover(path, source)
    }
}
