//! Deps command handler - generate deps.js

use crate::cli::{DepsArgs, OutputFormat};
use crate::commands::{display_base, to_json, CommandContext};
use crate::error::Result;
use crate::fs_utils::normalize_path;
use crate::generator::{generate_deps_js, write_deps_js};

/// Run the deps command
///
/// Without `--output` the deps.js text is the command output. With it the
/// file is written and a short summary is returned instead.
pub fn run_deps(args: &DepsArgs, ctx: &CommandContext) -> Result<String> {
    let mut engine = ctx.engine(&args.resolve)?;
    engine.resolve()?;

    let output_path = args.output.as_deref().map(normalize_path);
    let base = match (&args.base, &output_path) {
        (Some(base), _) => normalize_path(base),
        (None, Some(out)) => out
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| display_base(&engine.config().resolve.roots)),
        (None, None) => display_base(&engine.config().resolve.roots),
    };

    let content = generate_deps_js(
        engine.modules(),
        &base,
        engine.config().resolve.entries_only,
    );
    let lines = content.lines().count();

    let Some(path) = output_path else {
        return Ok(content);
    };
    write_deps_js(&path, &content)?;

    let output = match ctx.format {
        OutputFormat::Json => {
            let json_value = serde_json::json!({
                "_type": "deps",
                "output": path.to_string_lossy(),
                "base": base.to_string_lossy(),
                "dependencies": lines,
            });
            let mut json = to_json(&json_value)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format!("Wrote {} dependencies to {}\n", lines, path.display()),
    };
    Ok(output)
}
