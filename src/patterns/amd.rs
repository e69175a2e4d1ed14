//! AMD module declarations
//!
//! A file calling `define(...)` or `require(...)` provides its own path, so
//! other modules can depend on it by file name. `define('name', [...])`
//! additionally provides `name`. String elements of the dependency array
//! are required; an element naming an existing file next to the module
//! (`./util` or `./util.js`) is required by that file's absolute path.

use std::path::{Path, PathBuf};

use super::common::{array_strings, call_arguments, get_node_text, string_value};
use super::{Declarations, MatchContext, PatternSet};
use crate::fs_utils::normalize_path;
use tree_sitter::Node;

impl PatternSet {
    /// Rules for AMD `define` / `require` calls
    pub fn amd() -> Self {
        let mut set = PatternSet::new("amd");
        set.add_rule("call_expression", match_amd_call);
        set
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AmdCall {
    Define,
    Require,
}

fn amd_call(node: &Node<'_>, source: &str) -> Option<AmdCall> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" {
        return None;
    }
    let name = get_node_text(&function, source);
    if name.ends_with("define") {
        Some(AmdCall::Define)
    } else if name.ends_with("require") {
        Some(AmdCall::Require)
    } else {
        None
    }
}

fn match_amd_call(ctx: &MatchContext<'_>, node: &Node<'_>, decls: &mut Declarations) {
    let Some(call) = amd_call(node, ctx.source) else {
        return;
    };
    decls.provide(ctx.path.to_string_lossy().into_owned());

    let args = call_arguments(node);
    let mut args = args.iter().peekable();

    if call == AmdCall::Define {
        if let Some(name) = args.peek().and_then(|a| string_value(a, ctx.source)) {
            decls.provide(name);
            args.next();
        }
    }

    let Some(deps) = args.next().and_then(|a| array_strings(a, ctx.source)) else {
        return;
    };
    let base = ctx.path.parent().unwrap_or_else(|| Path::new(""));
    for dep in deps {
        match existing_module(base, &dep) {
            Some(file) => decls.require(file.to_string_lossy().into_owned()),
            None => decls.require(dep),
        }
    }
}

/// `dep` resolved against `base` if it names a file, with or without `.js`
fn existing_module(base: &Path, dep: &str) -> Option<PathBuf> {
    let direct = base.join(dep);
    if direct.is_file() {
        return Some(normalize_path(&direct));
    }
    let with_ext = base.join(format!("{dep}.js"));
    if with_ext.is_file() {
        return Some(normalize_path(&with_ext));
    }
    None
}
