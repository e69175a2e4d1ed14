//! Cross-platform filesystem utilities
//!
//! - `normalize_path`: absolute, `\\?\`-free paths usable as stable keys
//! - `relative_slash_path`: `/`-separated relative paths for generated output
//! - `atomic_rename`: file replacement that also works on Windows
//! - `get_cache_base_dir`: platform cache directory

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Normalize a path into a stable key.
///
/// Relative paths are joined onto the current directory, `.` and `..`
/// components are folded lexically, and on Windows the extended-length
/// `\\?\` prefix added by `canonicalize()` is stripped.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use closure_deps::fs_utils::normalize_path;
///
/// let path = PathBuf::from("/home/user/repo/./src/../lib/a.js");
/// assert_eq!(normalize_path(&path), PathBuf::from("/home/user/repo/lib/a.js"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    strip_verbatim_prefix(out)
}

#[cfg(windows)]
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    let s = path.to_string_lossy();
    // \\?\UNC\server\share -> \\server\share
    if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{}", stripped));
    }
    // \\?\C:\path -> C:\path
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        return PathBuf::from(stripped);
    }
    path
}

#[cfg(not(windows))]
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    path
}

/// `path` relative to `root`, always `/`-separated
///
/// Paths outside `root` climb with `..` components.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let root: Vec<Component> = root.components().collect();
    let target: Vec<Component> = path.components().collect();

    let common = root
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..root.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

/// Last modification time of `path`
pub fn file_mtime(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Cross-platform atomic rename that handles Windows file replacement.
///
/// On Unix, `fs::rename` atomically replaces the target if it exists.
/// On Windows, `fs::rename` fails if the target exists, so the target is
/// deleted first.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use closure_deps::fs_utils::atomic_rename;
///
/// std::fs::write("deps.js.tmp", "goog.addDependency(...);")?;
/// atomic_rename(Path::new("deps.js.tmp"), Path::new("deps.js"))?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}

/// Get platform-appropriate cache base directory.
///
/// - **Windows**: `%LOCALAPPDATA%\closure-deps\cache`
/// - **Unix**: `$XDG_CACHE_HOME/closure-deps` or `~/.cache/closure-deps`
/// - **Fallback**: System temp directory + `closure-deps`
pub fn get_cache_base_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(local_appdata) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(local_appdata)
                .join("closure-deps")
                .join("cache");
        }
        if let Some(home) = dirs::home_dir() {
            return home
                .join("AppData")
                .join("Local")
                .join("closure-deps")
                .join("cache");
        }
    }

    #[cfg(not(windows))]
    {
        if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
            return PathBuf::from(xdg_cache).join("closure-deps");
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".cache").join("closure-deps");
        }
    }

    std::env::temp_dir().join("closure-deps")
}

// FNV-1a constants for 64-bit hash
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Compute a stable FNV-1a hash
pub fn fnv1a_hash(data: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Default cache file for a set of roots scanned by one discoverer
///
/// Keyed by a hash of the normalized roots and the discoverer fingerprint,
/// so every project and pattern family gets its own file under
/// [`get_cache_base_dir`].
pub fn default_cache_path(roots: &[PathBuf], fingerprint: &str) -> PathBuf {
    let mut key: Vec<String> = roots
        .iter()
        .map(|r| normalize_path(r).to_string_lossy().into_owned())
        .collect();
    key.sort();
    key.push(fingerprint.to_string());
    get_cache_base_dir().join(format!("{:016x}.json", fnv1a_hash(&key.join("\n"))))
}
