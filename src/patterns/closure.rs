//! Closure Library declarations
//!
//! `goog.provide('a.b')` and `goog.module('a.b')` provide `a.b`;
//! `goog.require('c.d')` requires `c.d`. Only calls with exactly one string
//! literal argument count, so `goog.require(name)` or
//! `goog.provide('x', y)` are ignored.

use super::common::{call_arguments, callee_path, string_value};
use super::{Declarations, MatchContext, PatternSet};
use tree_sitter::Node;

impl PatternSet {
    /// Rules for `goog.provide` / `goog.module` / `goog.require`
    pub fn closure() -> Self {
        let mut set = PatternSet::new("closure");
        set.add_rule("call_expression", match_goog_call);
        set
    }
}

fn match_goog_call(ctx: &MatchContext<'_>, node: &Node<'_>, decls: &mut Declarations) {
    let Some(callee) = callee_path(node, ctx.source) else {
        return;
    };
    let provide = match callee.as_str() {
        "goog.provide" | "goog.module" => true,
        "goog.require" => false,
        _ => return,
    };

    let args = call_arguments(node);
    if args.len() != 1 {
        return;
    }
    let Some(name) = string_value(&args[0], ctx.source) else {
        return;
    };

    if provide {
        decls.provide(name);
    } else {
        decls.require(name);
    }
}
