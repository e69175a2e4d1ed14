//! deps.js output
//!
//! One `goog.addDependency` line per file, in closure order:
//!
//! ```text
//! goog.addDependency("lib/c.js", ["C"], []);
//! goog.addDependency("lib/b.js", ["B"], ["C"]);
//! goog.addDependency("app/a.js", ["A"], ["B"]);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DepsError, Result};
use crate::fs_utils::{atomic_rename, relative_slash_path};
use crate::module::{ModuleMap, ModuleRecord};

/// deps.js text for `modules`
///
/// With `entries_only`, only the closures of entry records are emitted;
/// otherwise every record's closure is. Each file appears once, at its
/// first position in the concatenated closures. Paths are relative to
/// `root`.
pub fn generate_deps_js(modules: &ModuleMap, root: &Path, entries_only: bool) -> String {
    let mut seen: HashSet<&Path> = HashSet::new();
    let mut out = String::new();

    let selected: Box<dyn Iterator<Item = &ModuleRecord> + '_> = if entries_only {
        Box::new(modules.entries())
    } else {
        Box::new(modules.iter())
    };

    for record in selected {
        for path in closure_of(record) {
            if !seen.insert(path) {
                continue;
            }
            if let Some(dep) = modules.get(path) {
                out.push_str(&add_dependency_line(dep, root));
            }
        }
    }
    out
}

/// Closure of a resolved record, or just the record before resolution
fn closure_of(record: &ModuleRecord) -> Vec<&Path> {
    if record.is_resolved() {
        record
            .resolved_dependencies()
            .iter()
            .map(PathBuf::as_path)
            .collect()
    } else {
        vec![record.path()]
    }
}

fn add_dependency_line(record: &ModuleRecord, root: &Path) -> String {
    let rel = relative_slash_path(root, record.path());
    format!(
        "goog.addDependency({}, {}, {});\n",
        quote(&rel),
        quote_list(record.provides()),
        quote_list(record.direct_requires()),
    )
}

fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn quote_list(values: &[String]) -> String {
    let mut unique: Vec<&str> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value.as_str()) {
            unique.push(value);
        }
    }
    let quoted: Vec<String> = unique.iter().map(|v| quote(v)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Write `content` to `path` via a temporary file and rename
pub fn write_deps_js(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DepsError::io(parent, e))?;
        }
    }

    let tmp = path.with_extension("js.tmp");
    fs::write(&tmp, content).map_err(|e| DepsError::io(&tmp, e))?;
    atomic_rename(&tmp, path).map_err(|e| DepsError::io(path, e))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote deps.js");
    Ok(())
}
