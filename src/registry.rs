//! Provided-name registry
//!
//! Maps every provided name to the one file that owns it. A registry is
//! owned by a single resolution run and cleared once that run has turned
//! every name into a path; nothing survives between runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{DepsError, Result};

/// Mapping from provided name to owning file
///
/// Has no locking of its own: discovery funnels every registration through
/// one coordinator so the duplicate check cannot race.
#[derive(Debug, Default, Clone)]
pub struct SymbolRegistry {
    owners: HashMap<String, PathBuf>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as the owner of `name`
    ///
    /// Re-registering the same owner is a no-op. A different owner for a
    /// live name fails with [`DepsError::DuplicateProvider`] and leaves the
    /// original owner in place.
    pub fn add(&mut self, name: &str, path: &Path) -> Result<()> {
        match self.owners.get(name) {
            Some(original) if original == path => Ok(()),
            Some(original) => Err(DepsError::DuplicateProvider {
                name: name.to_string(),
                path: path.to_path_buf(),
                original: original.clone(),
            }),
            None => {
                self.owners.insert(name.to_string(), path.to_path_buf());
                Ok(())
            }
        }
    }

    /// Register every name in `names`, stopping at the first conflict
    pub fn add_all<'a, I>(&mut self, names: I, path: &Path) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for name in names {
            self.add(name, path)?;
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Owning path for `name`, if any file provides it
    pub fn lookup(&self, name: &str) -> Option<&Path> {
        self.owners.get(name).map(PathBuf::as_path)
    }

    /// Release `name` so another file may provide it
    pub fn remove(&mut self, name: &str) -> Option<PathBuf> {
        self.owners.remove(name)
    }

    pub fn clear(&mut self) {
        self.owners.clear();
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
