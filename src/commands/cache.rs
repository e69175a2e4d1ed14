//! Cache command handler - inspect or delete a dependency cache file

use std::fs;
use std::path::PathBuf;

use crate::cli::{CacheArgs, CacheOperation, CacheTarget, OutputFormat, ResolveArgs};
use crate::commands::{to_json, CommandContext};
use crate::deps_cache::{CacheMode, DepsCache, CACHE_VERSION};
use crate::error::{DepsError, Result};
use crate::patterns::discoverer_for;

/// Run the cache command
pub fn run_cache(args: &CacheArgs, ctx: &CommandContext) -> Result<String> {
    match &args.operation {
        CacheOperation::Info(target) => run_cache_info(target, ctx),
        CacheOperation::Clear(target) => run_cache_clear(target, ctx),
    }
}

/// Cache file a target refers to and the discoverer fingerprint it is
/// written under, after configuration is applied
fn cache_path(target: &CacheTarget, ctx: &CommandContext) -> Result<(PathBuf, String)> {
    let config = ctx.load_config(&ResolveArgs {
        roots: target.roots.clone(),
        cache: target.cache.clone(),
        ..Default::default()
    })?;

    if config.cache.path.is_none() && config.resolve.roots.is_empty() {
        return Err(DepsError::ConfigError {
            message: "no cache file given (pass --cache, ROOT arguments or set resolve.roots)"
                .to_string(),
        });
    }
    let fingerprint =
        discoverer_for(config.resolve.pattern, &config.resolve.calls)?.fingerprint();
    match config.cache_mode(&fingerprint) {
        CacheMode::Durable(path) => Ok((path, fingerprint)),
        CacheMode::InMemory => Err(DepsError::ConfigError {
            message: "the configured cache is in-memory only".to_string(),
        }),
    }
}

/// Show cache information
fn run_cache_info(target: &CacheTarget, ctx: &CommandContext) -> Result<String> {
    let (path, fingerprint) = cache_path(target, ctx)?;
    let size = fs::metadata(&path).map(|m| m.len()).ok();
    let entries = if size.is_some() {
        DepsCache::load(CacheMode::Durable(path.clone()), &fingerprint).len()
    } else {
        0
    };

    let json_value = serde_json::json!({
        "_type": "cache_info",
        "path": path.to_string_lossy(),
        "exists": size.is_some(),
        "version": CACHE_VERSION,
        "discoverer": fingerprint,
        "entries": entries,
        "size_bytes": size.unwrap_or(0),
    });

    let mut output = String::new();
    match ctx.format {
        OutputFormat::Json => {
            output = to_json(&json_value)?;
            output.push('\n');
        }
        OutputFormat::Text => {
            output.push_str(&format!("path: {}\n", path.display()));
            output.push_str(&format!("discoverer: {}\n", fingerprint));
            match size {
                Some(size) => {
                    output.push_str(&format!("entries: {}\n", entries));
                    output.push_str(&format!("size: {} bytes\n", size));
                }
                None => output.push_str("No cache file exists.\n"),
            }
        }
    }

    Ok(output)
}

/// Delete the cache file
fn run_cache_clear(target: &CacheTarget, ctx: &CommandContext) -> Result<String> {
    let (path, _) = cache_path(target, ctx)?;
    let size = fs::metadata(&path).map(|m| m.len()).ok();
    if size.is_some() {
        fs::remove_file(&path).map_err(|e| DepsError::io(&path, e))?;
        tracing::info!(path = %path.display(), "removed deps cache");
    }

    let json_value = serde_json::json!({
        "_type": "cache_clear",
        "cleared": size.is_some(),
        "path": path.to_string_lossy(),
        "freed_bytes": size.unwrap_or(0),
    });

    let output = match ctx.format {
        OutputFormat::Json => {
            let mut json = to_json(&json_value)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => match size {
            Some(size) => format!("Cache cleared: {}\nFreed: {} bytes\n", path.display(), size),
            None => format!("No cache exists at: {}\n", path.display()),
        },
    };

    Ok(output)
}
