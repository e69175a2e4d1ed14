//! Pluggable discovery of provided and required names
//!
//! The resolver never looks at file content itself. It asks a [`Discover`]
//! implementation for the two name lists of each file:
//!
//! - [`TreeSitterDiscoverer`] parses the file and runs a [`PatternSet`],
//!   a table of syntax-node rules (Closure Library, AMD, or configured
//!   call rules).
//! - [`RegexDiscoverer`] scans comment-stripped text for
//!   `goog.provide`/`goog.require` without a grammar.
//!
//! # Rule dispatch
//!
//! Rules are registered against a node kind. The first match compiles a
//! kind -> rule table; the tree is then walked once and every node is handed
//! only to the rules registered for its kind. Registering another rule
//! drops the compiled table.

pub mod amd;
pub mod calls;
pub mod closure;
pub mod common;
pub mod regex;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

use crate::error::Result;
use crate::lang::Lang;
use crate::parsing::parse_source;

pub use self::calls::{CallRule, Role};
pub use self::regex::RegexDiscoverer;

/// Names a single file declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provided name, ignoring repeats
    pub fn provide(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.provides.contains(&name) {
            self.provides.push(name);
        }
    }

    /// Add a required name; repeats are kept
    pub fn require(&mut self, name: impl Into<String>) {
        self.requires.push(name.into());
    }
}

/// Capability that turns file content into declared names
pub trait Discover: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Identifies the declarations this discoverer produces
    ///
    /// Cached facts are only reused under the same fingerprint. Two
    /// discoverers that can report different names for one file must not
    /// share one.
    fn fingerprint(&self) -> String {
        self.name().to_string()
    }

    /// Declarations of the file at `path` whose content is `source`
    fn discover(&self, path: &Path, source: &str) -> Result<Declarations>;
}

/// What a rule handler sees besides the node
pub struct MatchContext<'s> {
    pub path: &'s Path,
    pub source: &'s str,
}

/// Rule callback
pub type Handler = Box<dyn Fn(&MatchContext<'_>, &Node<'_>, &mut Declarations) + Send + Sync>;

struct Rule {
    kind: String,
    handler: Handler,
}

/// Node-kind keyed collection of match rules
#[derive(Default)]
pub struct PatternSet {
    name: String,
    rules: Vec<Rule>,
    /// Signatures of the configured call rules, in registration order
    calls: Vec<String>,
    dispatch: OnceCell<HashMap<String, Vec<usize>>>,
}

impl PatternSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            calls: Vec::new(),
            dispatch: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Family name plus the configured call rules
    pub fn fingerprint(&self) -> String {
        if self.calls.is_empty() {
            self.name.clone()
        } else {
            format!("{}+{}", self.name, self.calls.join(","))
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Register `handler` for nodes of `kind`
    pub fn add_rule<F>(&mut self, kind: &str, handler: F) -> &mut Self
    where
        F: Fn(&MatchContext<'_>, &Node<'_>, &mut Declarations) + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            kind: kind.to_string(),
            handler: Box::new(handler),
        });
        self.dispatch = OnceCell::new();
        self
    }

    /// Append the configured call rules
    pub fn with_calls(mut self, rules: &[CallRule]) -> Self {
        for rule in rules {
            rule.register(&mut self);
        }
        self
    }

    /// Build the kind -> rules table if it is not built yet
    pub fn compile(&self) -> &HashMap<String, Vec<usize>> {
        self.dispatch.get_or_init(|| {
            let mut table: HashMap<String, Vec<usize>> = HashMap::new();
            for (idx, rule) in self.rules.iter().enumerate() {
                table.entry(rule.kind.clone()).or_default().push(idx);
            }
            table
        })
    }

    pub fn is_compiled(&self) -> bool {
        self.dispatch.get().is_some()
    }

    /// Run every rule over `tree`
    pub fn match_tree(&self, path: &Path, source: &str, tree: &Tree) -> Declarations {
        let table = self.compile();
        let ctx = MatchContext { path, source };
        let mut decls = Declarations::new();

        common::visit_all(&tree.root_node(), |node| {
            if let Some(indices) = table.get(node.kind()) {
                for &idx in indices {
                    (self.rules[idx].handler)(&ctx, node, &mut decls);
                }
            }
        });
        decls
    }
}

impl std::fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternSet")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

/// Discoverer that parses with tree-sitter and applies a [`PatternSet`]
#[derive(Debug)]
pub struct TreeSitterDiscoverer {
    patterns: PatternSet,
}

impl TreeSitterDiscoverer {
    pub fn new(patterns: PatternSet) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

impl Discover for TreeSitterDiscoverer {
    fn name(&self) -> &str {
        self.patterns.name()
    }

    fn fingerprint(&self) -> String {
        self.patterns.fingerprint()
    }

    fn discover(&self, path: &Path, source: &str) -> Result<Declarations> {
        let lang = Lang::from_path(path)?;
        let tree = parse_source(path, source, lang)?;
        Ok(self.patterns.match_tree(path, source, &tree))
    }
}

/// Built-in pattern families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// `goog.provide` / `goog.module` / `goog.require`
    #[default]
    Closure,
    /// `define([...])` / `require([...])`
    Amd,
    /// Grammar-free `goog.provide` / `goog.require` scanning
    Regex,
}

/// Discoverer selected by configuration
///
/// Call rules apply to the tree-sitter families only; the regex scanner
/// knows the Closure Library calls and nothing else.
pub fn discoverer_for(kind: PatternKind, calls: &[CallRule]) -> Result<Box<dyn Discover>> {
    for rule in calls {
        rule.validate()?;
    }
    let discoverer: Box<dyn Discover> = match kind {
        PatternKind::Closure => Box::new(TreeSitterDiscoverer::new(
            PatternSet::closure().with_calls(calls),
        )),
        PatternKind::Amd => Box::new(TreeSitterDiscoverer::new(
            PatternSet::amd().with_calls(calls),
        )),
        PatternKind::Regex => {
            if !calls.is_empty() {
                tracing::warn!("call rules are ignored by the regex discoverer");
            }
            Box::new(RegexDiscoverer::new()?)
        }
    };
    Ok(discoverer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_declarations_dedup_provides_only() {
        let mut decls = Declarations::new();
        decls.provide("a");
        decls.provide("a");
        decls.require("b");
        decls.require("b");
        assert_eq!(decls.provides, vec!["a"]);
        assert_eq!(decls.requires, vec!["b", "b"]);
    }

    #[test]
    fn test_rules_dispatch_by_kind() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let mut set = PatternSet::new("test");
        set.add_rule("string", move |_, _, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        set.add_rule("identifier", |ctx, node, decls| {
            decls.require(common::get_node_text(node, ctx.source));
        });

        let source = "foo('a', 'b');";
        let tree = parse_source(Path::new("t.js"), source, Lang::JavaScript).unwrap();
        let decls = set.match_tree(Path::new("t.js"), source, &tree);

        assert_eq!(seen.load(Ordering::Relaxed), 2);
        assert_eq!(decls.requires, vec!["foo"]);
        assert!(set.is_compiled());
    }

    #[test]
    fn test_adding_rule_invalidates_compiled_table() {
        let mut set = PatternSet::new("test");
        set.add_rule("string", |_, _, _| {});
        set.compile();
        assert!(set.is_compiled());

        set.add_rule("array", |_, _, _| {});
        assert!(!set.is_compiled());
        assert_eq!(set.compile().len(), 2);
    }

    #[test]
    fn test_discoverer_for_selects_implementation() {
        assert_eq!(discoverer_for(PatternKind::Closure, &[]).unwrap().name(), "closure");
        assert_eq!(discoverer_for(PatternKind::Amd, &[]).unwrap().name(), "amd");
        assert_eq!(discoverer_for(PatternKind::Regex, &[]).unwrap().name(), "regex");
    }

    #[test]
    fn test_fingerprint_distinguishes_families_and_call_rules() {
        let closure = discoverer_for(PatternKind::Closure, &[]).unwrap().fingerprint();
        let amd = discoverer_for(PatternKind::Amd, &[]).unwrap().fingerprint();
        let regex = discoverer_for(PatternKind::Regex, &[]).unwrap().fingerprint();
        assert_eq!(closure, "closure");
        assert_ne!(closure, amd);
        assert_ne!(closure, regex);

        let using = [CallRule::new("camp.using", Role::Require)];
        let module = [CallRule::namespaced("camp.using", Role::Require)];
        let with_using = discoverer_for(PatternKind::Closure, &using).unwrap().fingerprint();
        let with_module = discoverer_for(PatternKind::Closure, &module).unwrap().fingerprint();
        assert_eq!(with_using, "closure+camp.using=require");
        assert_ne!(with_using, with_module);
    }

    #[test]
    fn test_discoverer_for_validates_call_rules() {
        let bad = [CallRule::new("not a callee", Role::Require)];
        assert!(discoverer_for(PatternKind::Closure, &bad).is_err());
    }

    #[test]
    fn test_tree_sitter_discoverer_rejects_unknown_extension() {
        let discoverer = TreeSitterDiscoverer::new(PatternSet::closure());
        assert!(discoverer
            .discover(Path::new("style.css"), "body {}")
            .is_err());
    }
}
