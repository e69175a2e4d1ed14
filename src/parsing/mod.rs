//! Syntax tree production for discovery
//!
//! Tree-sitter recovers from errors and always hands back a tree; a
//! dependency resolver must not, since a half-parsed file may hide
//! `provide`/`require` calls. Any ERROR or MISSING node is therefore turned
//! into a [`DepsError::SyntaxError`] pointing at the first offending spot.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{DepsError, Result};
use crate::lang::Lang;

/// Parse `source` as `lang`, rejecting trees with syntax errors
pub fn parse_source(path: &Path, source: &str, lang: Lang) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&lang.grammar())
        .map_err(|e| DepsError::ConfigError {
            message: format!("Failed to set language {}: {:?}", lang.name(), e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| DepsError::SyntaxError {
            path: path.to_path_buf(),
            line: 0,
            column: 0,
            message: "parser produced no tree".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let (node, message) = first_error(&root).unwrap_or((root, "syntax error".to_string()));
        let pos = node.start_position();
        return Err(DepsError::SyntaxError {
            path: path.to_path_buf(),
            line: pos.row + 1,
            column: pos.column + 1,
            message,
        });
    }

    Ok(tree)
}

/// First ERROR or MISSING node in document order (iterative walk)
fn first_error<'t>(root: &Node<'t>) -> Option<(Node<'t>, String)> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_missing() {
            return Some((node, format!("missing '{}'", node.kind())));
        }
        if node.is_error() {
            return Some((node, "unexpected token".to_string()));
        }

        // Only descend into subtrees that contain the error.
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}
