//! Source file enumeration under the configured roots

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use regex::Regex;

use crate::error::{DepsError, Result};
use crate::fs_utils::normalize_path;

/// Default include pattern: JavaScript and TypeScript sources
pub const DEFAULT_INCLUDE: &str = r"\.(js|mjs|cjs|jsx|ts|mts|cts|tsx)$";

/// Every file under `roots` whose normalized path matches `include` and not
/// `exclude`, sorted and de-duplicated.
///
/// A root may itself be a file. `.gitignore` rules are honored inside git
/// repositories and symlinks are not followed.
pub fn for_each_file(
    roots: &[PathBuf],
    exclude: Option<&Regex>,
    include: &Regex,
) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    let accept = |path: &Path| {
        let text = path.to_string_lossy();
        include.is_match(&text) && !exclude.is_some_and(|re| re.is_match(&text))
    };

    for root in roots {
        let root = normalize_path(root);
        if !root.exists() {
            return Err(DepsError::io(&root, "root does not exist"));
        }
        if root.is_file() {
            if accept(&root) {
                files.insert(root);
            }
            continue;
        }

        for entry in build_walker(&root) {
            let entry = entry.map_err(|e| DepsError::io(&root, e))?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = normalize_path(entry.path());
            if accept(&path) {
                files.insert(path);
            }
        }
    }

    tracing::debug!(count = files.len(), "enumerated source files");
    Ok(files.into_iter().collect())
}

fn build_walker(root: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);

    // Respect .gitignore
    builder.git_ignore(true);
    builder.git_global(true);
    builder.git_exclude(true);

    // Do not follow symlinks
    builder.follow_links(false);

    // Skip hidden files and directories such as .git
    builder.hidden(true);

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn include() -> Regex {
        Regex::new(DEFAULT_INCLUDE).unwrap()
    }

    #[test]
    fn test_walk_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/vendor")).unwrap();
        fs::write(root.join("b.js"), "").unwrap();
        fs::write(root.join("a.js"), "").unwrap();
        fs::write(root.join("style.css"), "").unwrap();
        fs::write(root.join("lib/c.js"), "").unwrap();
        fs::write(root.join("lib/vendor/d.js"), "").unwrap();

        let exclude = Regex::new("/vendor/").unwrap();
        let files = for_each_file(&[root.to_path_buf()], Some(&exclude), &include()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| crate::fs_utils::relative_slash_path(&normalize_path(root), p))
            .collect();
        assert_eq!(names, vec!["a.js", "b.js", "lib/c.js"]);
    }

    #[test]
    fn test_overlapping_roots_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/x.js"), "").unwrap();

        let files = for_each_file(
            &[root.to_path_buf(), root.join("sub"), root.join("sub/x.js")],
            None,
            &include(),
        )
        .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = for_each_file(&[dir.path().join("nope")], None, &include()).unwrap_err();
        assert!(matches!(err, DepsError::IoError { .. }));
    }

    #[test]
    fn test_default_include_covers_every_dialect() {
        let include = include();
        for lang in crate::lang::Lang::ALL {
            for ext in lang.extensions() {
                assert!(include.is_match(&format!("/src/file.{}", ext)), "{}", ext);
            }
        }
        assert!(!include.is_match("/src/file.json"));
    }
}
