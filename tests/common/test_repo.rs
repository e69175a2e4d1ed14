//! TestRepo builder for integration testing
//!
//! Creates throwaway source trees with controlled modification times and
//! drives the built `closure-deps` binary against them.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, SystemTime};

use closure_deps::fs_utils::normalize_path;
use tempfile::TempDir;

/// Builder for creating test source trees
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty test repository
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the normalized path to the test repository root
    pub fn path(&self) -> PathBuf {
        normalize_path(self.dir.path())
    }

    /// Absolute path of a file inside the repository
    pub fn file(&self, relative_path: &str) -> PathBuf {
        self.path().join(relative_path)
    }

    /// Add a source file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.file(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Remove a file from the repository
    pub fn delete_file(&self, relative_path: &str) -> &Self {
        fs::remove_file(self.file(relative_path)).expect("Failed to delete file");
        self
    }

    /// Set a file's modification time
    pub fn set_mtime(&self, relative_path: &str, mtime: SystemTime) -> &Self {
        File::options()
            .write(true)
            .open(self.file(relative_path))
            .and_then(|f| f.set_modified(mtime))
            .expect("Failed to set mtime");
        self
    }

    /// Push every listed file an hour into the past
    pub fn age_files(&self, relative_paths: &[&str]) -> &Self {
        let past = SystemTime::now() - Duration::from_secs(3600);
        for path in relative_paths {
            self.set_mtime(path, past);
        }
        self
    }

    /// The a -> b -> c Closure Library chain
    pub fn with_closure_chain(&self) -> &Self {
        self.add_file("a.js", "goog.provide('A');\ngoog.require('B');\n")
            .add_file("b.js", "goog.provide('B');\ngoog.require('C');\n")
            .add_file("c.js", "goog.provide('C');\n")
    }

    /// Diamond: main -> {left, right} -> base
    pub fn with_diamond(&self) -> &Self {
        self.add_file(
            "app/main.js",
            "goog.require('app.left');\ngoog.require('app.right');\n",
        )
        .add_file(
            "app/left.js",
            "goog.provide('app.left');\ngoog.require('lib.base');\n",
        )
        .add_file(
            "app/right.js",
            "goog.provide('app.right');\ngoog.require('lib.base');\n",
        )
        .add_file("lib/base.js", "goog.provide('lib.base');\n")
    }

    /// Run the closure-deps CLI inside the repository
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_closure-deps"))
            .current_dir(self.path())
            .env_remove("CLOSURE_DEPS_CONFIG")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (Option<i32>, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative slash paths of a closure, for readable assertions
pub fn rel_paths(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| closure_deps::fs_utils::relative_slash_path(root, p))
        .collect()
}
