//! Variable resolution.
//!
//! Scans the whole tree for declarations of and assignments to a given set of
//! names and records the literal each one is bound to. Only literal
//! right-hand sides count; anything computed is ignored.

use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};
use crate::utils::helpers::strip_sign_markers;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Assigned literals must stringify to at least this many characters.
/// Filters out the single-digit counters the obfuscator reuses everywhere.
pub const ASSIGNMENT_MIN_LEN: usize = 2;
/// Declarator initializers must stringify to at least this many characters.
pub const DECLARATOR_MIN_LEN: usize = 1;

/// How declarator initializers interact with bindings already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingPolicy {
    /// Every qualifying declarator or assignment replaces the previous value.
    Overwrite,
    /// A declarator never replaces an existing binding; assignments still do.
    StickyDeclarations,
}

/// Resolved name → literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bindings {
    pub values: BTreeMap<String, String>,
}

impl Bindings {
    /// Literal text bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn bind(&mut self, name: &str, value: String) {
        log::trace!("bind {name} = {value}");
        self.values.insert(name.to_string(), value);
    }
}

/// Resolve `names` against every declaration and assignment in `tree`.
///
/// Names may carry leading sign markers (`"-qX"`); they are stripped before
/// lookup. The result is a pure function of the tree, the name set and the
/// policy.
pub fn resolve<S: AsRef<str>>(tree: &SyntaxTree, names: &[S], policy: BindingPolicy) -> Bindings {
    let wanted: HashSet<&str> = names
        .iter()
        .map(|n| strip_sign_markers(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();

    let mut bindings = Bindings::default();
    if wanted.is_empty() {
        return bindings;
    }

    for node in tree.nodes() {
        match &node.kind {
            NodeKind::Assignment { .. } => {
                let Some(target) = node.left().and_then(SyntaxNode::name) else {
                    continue;
                };
                if !wanted.contains(target) {
                    continue;
                }
                if let Some(value) = literal_text(node.right(), ASSIGNMENT_MIN_LEN) {
                    bindings.bind(target, value);
                }
            }
            NodeKind::VariableDeclarator {
                name: Some(name), ..
            } => {
                if !wanted.contains(name.as_str()) {
                    continue;
                }
                if policy == BindingPolicy::StickyDeclarations && bindings.get(name).is_some() {
                    continue;
                }
                if let Some(value) = literal_text(node.init(), DECLARATOR_MIN_LEN) {
                    bindings.bind(name, value);
                }
            }
            _ => {}
        }
    }

    log::debug!(
        "resolved {}/{} names ({policy:?})",
        bindings.len(),
        wanted.len()
    );
    bindings
}

/// Stringified literal value of `node`, if it is a literal at least
/// `min_len` characters long.
fn literal_text(node: Option<&SyntaxNode>, min_len: usize) -> Option<String> {
    node?
        .literal()?
        .to_js_string()
        .filter(|s| s.chars().count() >= min_len)
}
