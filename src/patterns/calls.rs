//! Configurable call rules
//!
//! Projects with their own module helpers declare them in configuration:
//!
//! ```toml
//! [[resolve.calls]]
//! callee = "camp.using"
//! role = "require"
//!
//! [[resolve.calls]]
//! callee = "camp.module"
//! role = "provide"
//! namespace_members = true
//! ```
//!
//! A plain rule takes the single string argument as the name. A rule with
//! `namespace_members` reads a namespace string and an array of member
//! names: `camp.module('app', ['A', 'B'], fn)` provides `app.A` and `app.B`.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::common::{array_strings, call_arguments, callee_path, string_value};
use super::{Declarations, MatchContext, PatternSet};
use crate::error::{DepsError, Result};

/// Which list a call rule feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Provide,
    Require,
}

/// `object.property(...)` call that declares names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRule {
    pub callee: String,
    pub role: Role,
    #[serde(default)]
    pub namespace_members: bool,
}

impl CallRule {
    pub fn new(callee: impl Into<String>, role: Role) -> Self {
        Self {
            callee: callee.into(),
            role,
            namespace_members: false,
        }
    }

    pub fn namespaced(callee: impl Into<String>, role: Role) -> Self {
        Self {
            namespace_members: true,
            ..Self::new(callee, role)
        }
    }

    /// Reject callees that can never match a dotted call
    pub fn validate(&self) -> Result<()> {
        let valid = !self.callee.is_empty()
            && self.callee.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if valid {
            Ok(())
        } else {
            Err(DepsError::InvalidPattern {
                pattern: self.callee.clone(),
                message: "callee must be a dotted identifier path".to_string(),
            })
        }
    }

    /// Stable one-line form, e.g. `camp.module=provide[]`
    pub fn signature(&self) -> String {
        let role = match self.role {
            Role::Provide => "provide",
            Role::Require => "require",
        };
        let members = if self.namespace_members { "[]" } else { "" };
        format!("{}={}{}", self.callee, role, members)
    }

    pub(crate) fn register(&self, set: &mut PatternSet) {
        set.calls.push(self.signature());
        let rule = self.clone();
        set.add_rule("call_expression", move |ctx, node, decls| {
            rule.apply(ctx, node, decls)
        });
    }

    fn apply(&self, ctx: &MatchContext<'_>, node: &Node<'_>, decls: &mut Declarations) {
        if callee_path(node, ctx.source).as_deref() != Some(self.callee.as_str()) {
            return;
        }
        let args = call_arguments(node);

        let names: Vec<String> = if self.namespace_members {
            let (Some(ns), Some(members)) = (
                args.first().and_then(|a| string_value(a, ctx.source)),
                args.get(1).and_then(|a| array_strings(a, ctx.source)),
            ) else {
                return;
            };
            members.into_iter().map(|m| format!("{ns}.{m}")).collect()
        } else {
            if args.len() != 1 {
                return;
            }
            match string_value(&args[0], ctx.source) {
                Some(name) => vec![name],
                None => return,
            }
        };

        for name in names {
            match self.role {
                Role::Provide => decls.provide(name),
                Role::Require => decls.require(name),
            }
        }
    }
}
