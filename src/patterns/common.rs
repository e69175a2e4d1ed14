//! Syntax-tree helpers shared by the pattern rule sets
//!
//! Node kinds are those of the tree-sitter JavaScript grammar, which the
//! TypeScript grammars share for calls, strings and arrays.

use tree_sitter::Node;

// ============================================================================
// Text Extraction
// ============================================================================

/// Get text content of a node
pub fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or("")
        .to_string()
}

/// Value of a string literal without its quotes
///
/// Accepts `'x'`, `"x"` and substitution-free template strings. Returns
/// `None` for anything that is not a plain literal.
pub fn string_value(node: &Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => {}
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            if has_substitution {
                return None;
            }
        }
        _ => return None,
    }

    let text = get_node_text(node, source);
    let mut chars = text.chars();
    chars.next()?;
    chars.next_back()?;
    Some(chars.as_str().to_string())
}

/// String values of every literal element of an array expression
pub fn array_strings(node: &Node, source: &str) -> Option<Vec<String>> {
    if node.kind() != "array" {
        return None;
    }
    let mut cursor = node.walk();
    let values = node
        .named_children(&mut cursor)
        .filter_map(|element| string_value(&element, source))
        .collect();
    Some(values)
}

// ============================================================================
// Call Expressions
// ============================================================================

/// Dotted callee of a call expression: `goog.require(...)` -> `goog.require`
///
/// Only identifier and property chains are named; computed members and
/// call results yield `None`.
pub fn callee_path(call: &Node, source: &str) -> Option<String> {
    if call.kind() != "call_expression" {
        return None;
    }
    let mut current = call.child_by_field_name("function")?;
    let mut parts: Vec<String> = Vec::new();

    loop {
        match current.kind() {
            "identifier" => {
                parts.push(get_node_text(&current, source));
                break;
            }
            "member_expression" => {
                let property = current.child_by_field_name("property")?;
                if property.kind() != "property_identifier" {
                    return None;
                }
                parts.push(get_node_text(&property, source));
                current = current.child_by_field_name("object")?;
            }
            _ => return None,
        }
    }

    parts.reverse();
    Some(parts.join("."))
}

/// Argument nodes of a call expression, comments excluded
pub fn call_arguments<'t>(call: &Node<'t>) -> Vec<Node<'t>> {
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

// ============================================================================
// AST Traversal
// ============================================================================

/// Visit all nodes in a tree with a visitor function (iterative to avoid stack overflow)
pub fn visit_all<'t, F>(node: &Node<'t>, mut visitor: F)
where
    F: FnMut(&Node<'t>),
{
    let mut cursor = node.walk();
    let mut did_visit_children = false;

    loop {
        if !did_visit_children {
            visitor(&cursor.node());

            if cursor.goto_first_child() {
                did_visit_children = false;
                continue;
            }
        }

        if cursor.goto_next_sibling() {
            did_visit_children = false;
            continue;
        }

        if !cursor.goto_parent() {
            break;
        }
        did_visit_children = true;
    }
}
