//! Transitive dependency resolution
//!
//! Computes, for every record in a [`ModuleMap`], the ordered and
//! de-duplicated closure of the files it depends on. The walk is an
//! explicit depth-first worklist of frames rather than recursive calls, so
//! deep require chains cannot overflow the native stack.
//!
//! # Memoization
//!
//! Every file whose children are fully known gets its own closure stored in
//! the memo before its frame is popped. Later walks that reach a memoized
//! file splice the stored closure in directly instead of descending again,
//! so shared subgraphs (diamonds, common base libraries) are expanded once
//! per resolver no matter how many records reach them.
//!
//! # Ordering
//!
//! A file is appended to a closure only after all of its own dependencies
//! have been appended (post-order), and the record being resolved is always
//! appended last.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DepsError, Result};
use crate::module::{ModuleMap, ModuleRecord};
use crate::registry::SymbolRegistry;

/// Counters describing the work a resolver performed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveStats {
    /// Records resolved by `resolve_all`
    pub records: usize,
    /// Frames pushed, i.e. files whose direct requires were expanded
    pub expansions: usize,
    /// Times a memoized closure was reused
    pub memo_hits: usize,
}

/// One pending file in the depth-first walk
struct Frame {
    path: PathBuf,
    children: Vec<PathBuf>,
    next: usize,
}

/// Memoizing closure resolver over one immutable module map
pub struct DependencyResolver<'a> {
    modules: &'a ModuleMap,
    registry: &'a SymbolRegistry,
    memo: HashMap<PathBuf, Vec<PathBuf>>,
    expanded: HashMap<PathBuf, usize>,
    stats: ResolveStats,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(modules: &'a ModuleMap, registry: &'a SymbolRegistry) -> Self {
        Self {
            modules,
            registry,
            memo: HashMap::new(),
            expanded: HashMap::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Resolve every record in `modules` and store each closure on its record
    ///
    /// Either every record receives its closure or none does: the first
    /// graph error aborts the pass before anything is written back.
    pub fn resolve_all(modules: &mut ModuleMap, registry: &SymbolRegistry) -> Result<ResolveStats> {
        let (closures, stats) = {
            let mut resolver = DependencyResolver::new(modules, registry);
            let mut closures = Vec::with_capacity(modules.len());
            for record in modules.iter() {
                let closure = resolver.resolve_closure(record)?;
                closures.push((record.path().to_path_buf(), closure));
            }
            resolver.stats.records = closures.len();
            (closures, resolver.stats)
        };

        for (path, closure) in closures {
            if let Some(record) = modules.get_mut(&path) {
                record.set_resolved_dependencies(closure);
            }
        }

        debug!(
            records = stats.records,
            expansions = stats.expansions,
            memo_hits = stats.memo_hits,
            "resolved module map"
        );
        Ok(stats)
    }

    /// Ordered closure of `record`, ending with the record itself
    pub fn resolve_closure(&mut self, record: &ModuleRecord) -> Result<Vec<PathBuf>> {
        let origin = record.path();
        if let Some(closure) = self.memo.get(origin) {
            self.stats.memo_hits += 1;
            return Ok(closure.clone());
        }

        let mut closure: Vec<PathBuf> = Vec::new();
        let mut registered: HashSet<PathBuf> = HashSet::new();
        let mut on_stack: HashSet<PathBuf> = HashSet::new();
        let mut frames: Vec<Frame> = Vec::new();

        self.push_frame(record, &mut frames, &mut on_stack)?;

        while let Some(frame) = frames.last_mut() {
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next].clone();
                frame.next += 1;

                if on_stack.contains(&child) {
                    return Err(DepsError::CyclicDependency {
                        file: frame.path.clone(),
                        target: child,
                    });
                }

                if let Some(memoized) = self.memo.get(&child) {
                    self.stats.memo_hits += 1;
                    for dep in memoized {
                        if registered.insert(dep.clone()) {
                            closure.push(dep.clone());
                        }
                    }
                    continue;
                }

                let child_record = self.record(&child)?;
                self.push_frame(child_record, &mut frames, &mut on_stack)?;
                continue;
            }

            // All children of this frame are known: finish it.
            let Some(done) = frames.pop() else { break };
            on_stack.remove(&done.path);

            if frames.is_empty() {
                closure.push(done.path.clone());
                self.memo.insert(done.path, closure.clone());
                return Ok(closure);
            }

            if registered.insert(done.path.clone()) {
                closure.push(done.path.clone());
            }
            if !self.memo.contains_key(&done.path) {
                self.record_closure(&done.path, &done.children)?;
            }
        }

        // The origin frame always finishes through the branch above.
        Ok(closure)
    }

    /// How many times the direct requires of `path` were expanded
    pub fn expansion_count(&self, path: &Path) -> usize {
        self.expanded.get(path).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Memoized closure for `path`, if already computed
    pub fn memoized(&self, path: &Path) -> Option<&[PathBuf]> {
        self.memo.get(path).map(Vec::as_slice)
    }

    fn push_frame(
        &mut self,
        record: &ModuleRecord,
        frames: &mut Vec<Frame>,
        on_stack: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        let children = self.direct_dependencies(record)?;
        let path = record.path().to_path_buf();

        *self.expanded.entry(path.clone()).or_insert(0) += 1;
        self.stats.expansions += 1;

        on_stack.insert(path.clone());
        frames.push(Frame {
            path,
            children,
            next: 0,
        });
        Ok(())
    }

    /// Translate a record's required names into owning file paths
    fn direct_dependencies(&self, record: &ModuleRecord) -> Result<Vec<PathBuf>> {
        record
            .direct_requires()
            .iter()
            .map(|name| {
                self.registry
                    .lookup(name)
                    .map(Path::to_path_buf)
                    .ok_or_else(|| DepsError::MissingDependency {
                        file: record.path().to_path_buf(),
                        name: name.clone(),
                    })
            })
            .collect()
    }

    fn record(&self, path: &Path) -> Result<&'a ModuleRecord> {
        let modules: &'a ModuleMap = self.modules;
        modules.get(path).ok_or_else(|| DepsError::IoError {
            path: path.to_path_buf(),
            message: "file is registered as a provider but was not discovered".to_string(),
        })
    }

    /// Build the closure of `path` from its children's memoized closures
    fn record_closure(&mut self, path: &Path, children: &[PathBuf]) -> Result<()> {
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut closure: Vec<PathBuf> = Vec::new();

        for child in children {
            let child_closure = self.memo.get(child).ok_or_else(|| DepsError::CyclicDependency {
                file: path.to_path_buf(),
                target: child.clone(),
            })?;
            for dep in child_closure {
                if seen.insert(dep.as_path()) {
                    closure.push(dep.clone());
                }
            }
        }
        closure.push(path.to_path_buf());

        self.memo.insert(path.to_path_buf(), closure);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    /// Build a map and registry from (file, provides, requires) triples
    fn graph(layout: &[(&str, &[&str], &[&str])]) -> (ModuleMap, SymbolRegistry) {
        let mut modules = ModuleMap::new();
        let mut registry = SymbolRegistry::new();
        for (file, provides, requires) in layout {
            let path = PathBuf::from(file);
            let provides: Vec<String> = provides.iter().map(|s| s.to_string()).collect();
            registry.add_all(&provides, &path).unwrap();
            let mut record = ModuleRecord::new(path, provides, SystemTime::UNIX_EPOCH);
            record.set_requires(requires.iter().copied());
            modules.insert(record);
        }
        (modules, registry)
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    fn position(closure: &[PathBuf], file: &str) -> usize {
        closure
            .iter()
            .position(|p| p == Path::new(file))
            .unwrap_or_else(|| panic!("{file} missing from {closure:?}"))
    }

    #[test]
    fn test_linear_chain() {
        let (modules, registry) = graph(&[
            ("a.js", &["A"], &["B"]),
            ("b.js", &["B"], &["C"]),
            ("c.js", &["C"], &[]),
        ]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();

        let closure = resolver.resolve_closure(a).unwrap();
        assert_eq!(closure, paths(&["c.js", "b.js", "a.js"]));
    }

    #[test]
    fn test_record_without_requires_is_its_own_closure() {
        let (modules, registry) = graph(&[("c.js", &["C"], &[])]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let c = modules.get(Path::new("c.js")).unwrap();
        assert_eq!(resolver.resolve_closure(c).unwrap(), paths(&["c.js"]));
    }

    #[test]
    fn test_diamond_expands_shared_node_once() {
        let (mut modules, registry) = graph(&[
            ("a.js", &[], &["B", "C"]),
            ("b.js", &["B"], &["D"]),
            ("c.js", &["C"], &["D"]),
            ("d.js", &["D"], &[]),
        ]);

        {
            let mut resolver = DependencyResolver::new(&modules, &registry);
            let a = modules.get(Path::new("a.js")).unwrap();
            let closure = resolver.resolve_closure(a).unwrap();

            assert_eq!(closure, paths(&["d.js", "b.js", "c.js", "a.js"]));
            assert_eq!(resolver.expansion_count(Path::new("d.js")), 1);
            assert_eq!(
                resolver.memoized(Path::new("b.js")).unwrap(),
                paths(&["d.js", "b.js"]).as_slice()
            );
            assert_eq!(
                resolver.memoized(Path::new("c.js")).unwrap(),
                paths(&["d.js", "c.js"]).as_slice()
            );

            for file in ["b.js", "c.js", "d.js"] {
                let record = modules.get(Path::new(file)).unwrap();
                resolver.resolve_closure(record).unwrap();
            }
            assert_eq!(resolver.expansion_count(Path::new("d.js")), 1);
        }

        let stats = DependencyResolver::resolve_all(&mut modules, &registry).unwrap();
        assert_eq!(stats.records, 4);
        assert_eq!(stats.expansions, 4);
    }

    #[test]
    fn test_ordering_invariant_on_wide_graph() {
        let (mut modules, registry) = graph(&[
            ("app.js", &[], &["ui", "net", "util"]),
            ("ui.js", &["ui"], &["dom", "util"]),
            ("net.js", &["net"], &["util", "json"]),
            ("dom.js", &["dom"], &["util"]),
            ("json.js", &["json"], &[]),
            ("util.js", &["util"], &[]),
        ]);
        DependencyResolver::resolve_all(&mut modules, &registry).unwrap();

        let edges = [
            ("app.js", "ui.js"),
            ("app.js", "net.js"),
            ("app.js", "util.js"),
            ("ui.js", "dom.js"),
            ("ui.js", "util.js"),
            ("net.js", "util.js"),
            ("net.js", "json.js"),
            ("dom.js", "util.js"),
        ];
        for record in &modules {
            let closure = record.resolved_dependencies();
            assert_eq!(closure.last().unwrap(), record.path());
            let unique: HashSet<&PathBuf> = closure.iter().collect();
            assert_eq!(unique.len(), closure.len(), "duplicates in {closure:?}");

            for (from, to) in edges {
                if closure.iter().any(|p| p == Path::new(from)) {
                    assert!(position(closure, to) < position(closure, from));
                }
            }
        }
        let app = modules.get(Path::new("app.js")).unwrap();
        assert_eq!(app.resolved_dependencies().len(), 6);
    }

    #[test]
    fn test_duplicate_requires_are_collapsed() {
        let (modules, registry) = graph(&[
            ("a.js", &[], &["B", "B", "C", "B"]),
            ("b.js", &["B"], &[]),
            ("c.js", &["C"], &["B"]),
        ]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();
        assert_eq!(
            resolver.resolve_closure(a).unwrap(),
            paths(&["b.js", "c.js", "a.js"])
        );
    }

    #[test]
    fn test_file_providing_several_names() {
        let (modules, registry) = graph(&[
            ("a.js", &[], &["x.One", "x.Two"]),
            ("x.js", &["x.One", "x.Two"], &[]),
        ]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();
        assert_eq!(resolver.resolve_closure(a).unwrap(), paths(&["x.js", "a.js"]));
    }

    #[test]
    fn test_three_file_cycle_is_rejected() {
        let (mut modules, registry) = graph(&[
            ("a.js", &["A"], &["B"]),
            ("b.js", &["B"], &["C"]),
            ("c.js", &["C"], &["A"]),
        ]);

        let err = DependencyResolver::resolve_all(&mut modules, &registry).unwrap_err();
        match err {
            DepsError::CyclicDependency { file, target } => {
                assert_eq!(file, PathBuf::from("c.js"));
                assert_eq!(target, PathBuf::from("a.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
        for record in &modules {
            assert!(!record.is_resolved());
        }
    }

    #[test]
    fn test_cycle_below_origin_is_rejected() {
        let (modules, registry) = graph(&[
            ("a.js", &[], &["B"]),
            ("b.js", &["B"], &["C"]),
            ("c.js", &["C"], &["B"]),
        ]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();
        let err = resolver.resolve_closure(a).unwrap_err();
        assert!(matches!(err, DepsError::CyclicDependency { .. }));
    }

    #[test]
    fn test_self_require_is_cyclic() {
        let (modules, registry) = graph(&[("a.js", &["A"], &["A"])]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();
        match resolver.resolve_closure(a).unwrap_err() {
            DepsError::CyclicDependency { file, target } => {
                assert_eq!(file, PathBuf::from("a.js"));
                assert_eq!(target, PathBuf::from("a.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_dependency_names_file_and_symbol() {
        let (modules, registry) = graph(&[
            ("a.js", &[], &["B"]),
            ("b.js", &["B"], &["nope.Missing"]),
        ]);
        let mut resolver = DependencyResolver::new(&modules, &registry);
        let a = modules.get(Path::new("a.js")).unwrap();
        match resolver.resolve_closure(a).unwrap_err() {
            DepsError::MissingDependency { file, name } => {
                assert_eq!(file, PathBuf::from("b.js"));
                assert_eq!(name, "nope.Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let layout: &[(&str, &[&str], &[&str])] = &[
            ("main.js", &[], &["b", "a"]),
            ("a.js", &["a"], &["c", "d"]),
            ("b.js", &["b"], &["d"]),
            ("c.js", &["c"], &[]),
            ("d.js", &["d"], &["c"]),
        ];
        let (mut first, registry) = graph(layout);
        DependencyResolver::resolve_all(&mut first, &registry).unwrap();
        let (mut second, registry) = graph(layout);
        DependencyResolver::resolve_all(&mut second, &registry).unwrap();

        for record in &first {
            let other = second.get(record.path()).unwrap();
            assert_eq!(record.resolved_dependencies(), other.resolved_dependencies());
        }
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let names: Vec<String> = (0..1000).map(|i| format!("n{i}")).collect();
        let mut modules = ModuleMap::new();
        let mut registry = SymbolRegistry::new();
        for (i, name) in names.iter().enumerate() {
            let path = PathBuf::from(format!("{name}.js"));
            registry.add(name, &path).unwrap();
            let mut record = ModuleRecord::new(path, vec![name.clone()], SystemTime::UNIX_EPOCH);
            if let Some(next) = names.get(i + 1) {
                record.add_require(next.clone());
            }
            modules.insert(record);
        }

        let mut resolver = DependencyResolver::new(&modules, &registry);
        let head = modules.get(Path::new("n0.js")).unwrap();
        let closure = resolver.resolve_closure(head).unwrap();
        assert_eq!(closure.len(), 1000);
        assert_eq!(closure.first().unwrap(), Path::new("n999.js"));
        assert_eq!(closure.last().unwrap(), Path::new("n0.js"));
    }
}
