//! Grammar-free `goog.provide` / `goog.require` scanning
//!
//! Comments are stripped first so commented-out calls do not count. The
//! stripping pattern also matches string, regex and CDATA literals; those
//! are kept verbatim so a `//` inside a string survives.

use std::path::Path;

use regex::{Captures, Regex};

use super::{Declarations, Discover};
use crate::error::{DepsError, Result};

const COMMENT_PATTERN: &str = r#"(/)(?:\*[\s\S]*?\*/|/.*)|"(?:\\[\s\S]|[^\\\n"])*"|'(?:\\[\s\S]|[^\\\n'])*'|<!\[CDATA\[[\s\S]*?\]\]>|/(?:\\.|\[(?:\\.|[^\n\]])*\]|[^\n/])+/\w*"#;
const PROVIDE_PATTERN: &str = r#"goog\.provide\(\s*?["']([\w.\-*]+)["']\s*?\)"#;
const REQUIRE_PATTERN: &str = r#"goog\.require\(\s*?["']([\w.\-*]+)["']\s*?\)"#;

/// Text-scanning discoverer for Closure Library sources
#[derive(Debug, Clone)]
pub struct RegexDiscoverer {
    comment: Regex,
    provide: Regex,
    require: Regex,
}

impl RegexDiscoverer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            comment: compile(COMMENT_PATTERN)?,
            provide: compile(PROVIDE_PATTERN)?,
            require: compile(REQUIRE_PATTERN)?,
        })
    }

    /// `source` with every comment removed
    pub fn strip_comments(&self, source: &str) -> String {
        self.comment
            .replace_all(source, |caps: &Captures| {
                if caps.get(1).is_some() {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DepsError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl Discover for RegexDiscoverer {
    fn name(&self) -> &str {
        "regex"
    }

    fn discover(&self, _path: &Path, source: &str) -> Result<Declarations> {
        let text = self.strip_comments(source);
        let mut decls = Declarations::new();
        for caps in self.provide.captures_iter(&text) {
            decls.provide(&caps[1]);
        }
        for caps in self.require.captures_iter(&text) {
            decls.require(&caps[1]);
        }
        Ok(decls)
    }
}
