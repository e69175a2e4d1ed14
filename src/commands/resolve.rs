//! Resolve command handler - print ordered dependency closures

use crate::cli::{OutputFormat, ResolveArgs};
use crate::commands::{display_base, to_json, CommandContext};
use crate::error::Result;
use crate::fs_utils::relative_slash_path;
use crate::module::ModuleRecord;

/// Run the resolve command
pub fn run_resolve(args: &ResolveArgs, ctx: &CommandContext) -> Result<String> {
    let mut engine = ctx.engine(args)?;
    engine.resolve()?;

    let selected = engine.selected();
    let base = display_base(&engine.config().resolve.roots);
    let stats = engine.stats().cloned().unwrap_or_default();

    if ctx.verbose {
        eprintln!(
            "Resolved {} files ({} from cache, {} parsed, {} expansions)",
            stats.discovery.files,
            stats.discovery.cache_hits,
            stats.discovery.parsed,
            stats.resolve.expansions
        );
    }

    let output = match ctx.format {
        OutputFormat::Json => {
            let records: Vec<&ModuleRecord> = selected.iter().collect();
            let json_value = serde_json::json!({
                "_type": "resolve",
                "base": base.to_string_lossy(),
                "files": stats.discovery.files,
                "cache_hits": stats.discovery.cache_hits,
                "parsed": stats.discovery.parsed,
                "modules": records,
            });
            let mut json = to_json(&json_value)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for record in &selected {
                output.push_str(&relative_slash_path(&base, record.path()));
                output.push('\n');
                for dep in record.resolved_dependencies() {
                    output.push_str(&format!("  - {}\n", relative_slash_path(&base, dep)));
                }
            }
            output
        }
    };

    Ok(output)
}
