//! Per-file dependency graph nodes
//!
//! A [`ModuleRecord`] is created by discovery for every file visited in a
//! run. Its required names stay symbolic until the resolver translates
//! them through the registry and fills in the ordered closure.

use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

/// One source file in the dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    path: PathBuf,
    provides: Vec<String>,
    requires: Vec<String>,
    #[serde(skip)]
    mtime: SystemTime,
    resolved_dependencies: Vec<PathBuf>,
}

impl ModuleRecord {
    /// Create a record; duplicate provided names collapse to their first
    /// occurrence.
    pub fn new(path: impl Into<PathBuf>, provides: Vec<String>, mtime: SystemTime) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(provides.len());
        for name in provides {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self {
            path: path.into(),
            provides: unique,
            requires: Vec::new(),
            mtime,
            resolved_dependencies: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn provides(&self) -> &[String] {
        &self.provides
    }

    /// Required names in declaration order, duplicates included
    pub fn direct_requires(&self) -> &[String] {
        &self.requires
    }

    pub fn add_require(&mut self, name: impl Into<String>) {
        self.requires.push(name.into());
    }

    /// Append `names` to the required names
    pub fn set_requires<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
    }

    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    /// Ordered closure: every dependency before its dependents, this file last.
    ///
    /// Empty until the resolver has run.
    pub fn resolved_dependencies(&self) -> &[PathBuf] {
        &self.resolved_dependencies
    }

    pub fn set_resolved_dependencies(&mut self, deps: Vec<PathBuf>) {
        debug_assert!(deps.last().map(|p| p == &self.path).unwrap_or(true));
        self.resolved_dependencies = deps;
    }

    pub fn is_resolved(&self) -> bool {
        !self.resolved_dependencies.is_empty()
    }

    /// An entry file provides nothing, so nothing can require it
    pub fn is_entry(&self) -> bool {
        self.provides.is_empty()
    }

    /// Newest modification time across the resolved closure
    ///
    /// Falls back to this file's own mtime before resolution.
    pub fn newest_modification_time(&self, modules: &ModuleMap) -> SystemTime {
        self.resolved_dependencies
            .iter()
            .filter_map(|path| modules.get(path))
            .map(|record| record.mtime)
            .fold(self.mtime, |newest, mtime| newest.max(mtime))
    }
}

/// All records discovered in a run, addressed by file path
///
/// Backed by a `BTreeMap` so iteration (and therefore resolution and
/// output) follows path order regardless of discovery scheduling.
#[derive(Debug, Default, Clone)]
pub struct ModuleMap {
    records: BTreeMap<PathBuf, ModuleRecord>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&mut self, record: ModuleRecord) -> Option<ModuleRecord> {
        self.records.insert(record.path.clone(), record)
    }

    pub fn get(&self, path: &Path) -> Option<&ModuleRecord> {
        self.records.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut ModuleRecord> {
        self.records.get_mut(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<ModuleRecord> {
        self.records.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.records.keys()
    }

    pub fn iter(&self) -> btree_map::Values<'_, PathBuf, ModuleRecord> {
        self.records.values()
    }

    /// Records that provide nothing
    pub fn entries(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values().filter(|r| r.is_entry())
    }

    /// A map holding only the entry records
    pub fn entries_only(&self) -> ModuleMap {
        ModuleMap {
            records: self
                .records
                .iter()
                .filter(|(_, r)| r.is_entry())
                .map(|(p, r)| (p.clone(), r.clone()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ModuleMap {
    type Item = &'a ModuleRecord;
    type IntoIter = btree_map::Values<'a, PathBuf, ModuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
