//! Source dialects the syntax-pattern matcher understands
//!
//! Everything scanned is JavaScript or one of its supersets; the TypeScript
//! grammars share the call, string and array node kinds the rule sets use.

use std::path::Path;
use tree_sitter::Language;

use crate::error::{DepsError, Result};

/// A parseable JavaScript-family dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl Lang {
    pub const ALL: [Lang; 4] = [Lang::JavaScript, Lang::Jsx, Lang::TypeScript, Lang::Tsx];

    /// Dialect of `path`, judged by its extension alone
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Err(DepsError::UnsupportedLanguage {
                extension: String::new(),
            }),
        }
    }

    /// Case-insensitive extension lookup
    pub fn from_extension(ext: &str) -> Result<Self> {
        let lower = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&lower.as_str()))
            .ok_or_else(|| DepsError::UnsupportedLanguage {
                extension: ext.to_string(),
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Lang::JavaScript => "javascript",
            Lang::Jsx => "jsx",
            Lang::TypeScript => "typescript",
            Lang::Tsx => "tsx",
        }
    }

    /// Grammar used to parse this dialect; plain JS and JSX share one
    pub fn grammar(&self) -> Language {
        match self {
            Lang::JavaScript | Lang::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Lang::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Lang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Lang::JavaScript => &["js", "mjs", "cjs"],
            Lang::Jsx => &["jsx"],
            Lang::TypeScript => &["ts", "mts", "cts"],
            Lang::Tsx => &["tsx"],
        }
    }
}
