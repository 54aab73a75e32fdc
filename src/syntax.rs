//! Owned syntax tree used by every extraction pass.
//!
//! The parser lowers the oxc AST into this small closed set of node kinds.
//! Extractors match exhaustively on [`NodeKind`], so a shape the pipeline
//! cannot see is a visible gap rather than a silently ignored field.

use crate::utils::helpers::js_number_to_string;
use serde::Serialize;
use std::fmt;

/// Half-open byte range `[start, end)` into the script text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A literal value as it appears in the script.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl Literal {
    /// The JavaScript `String(value)` of this literal.
    ///
    /// Returns `None` for `null`, which has no `toString` and can never be
    /// bound as a round constant.
    pub fn to_js_string(&self) -> Option<String> {
        match self {
            Literal::Number(v) => Some(js_number_to_string(*v)),
            Literal::String(s) => Some(s.clone()),
            Literal::Boolean(b) => Some(b.to_string()),
            Literal::Null => None,
        }
    }
}

/// Node discriminant.
///
/// Operators are kept as their source spelling (`"^"`, `"-"`, `"="`), which is
/// also what the extractors splice into symbolic expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program,
    ReturnStatement,
    ExpressionStatement,
    /// `id = init` inside a `var`/`let`/`const`. `name` is `None` for
    /// destructuring patterns; the initializer, when present, is the last child.
    VariableDeclarator { name: Option<String>, has_init: bool },
    Identifier(String),
    Literal(Literal),
    /// Children: `[argument]`.
    Unary { operator: &'static str },
    /// Children: `[left, right]`.
    Binary { operator: &'static str },
    /// Children: `[left, right]`.
    Logical { operator: &'static str },
    /// Children: `[target, value]`.
    Assignment { operator: &'static str },
    /// Children: the comma-separated elements, in order.
    Sequence,
    /// Children: `[callee, arguments...]`.
    Call,
    /// Any other expression or assignment target; children are its
    /// sub-expressions in source order.
    Other,
}

/// A node of the lowered tree. Children are owned; the tree is never mutated
/// after lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl Drop for SyntaxNode {
    // Flatten the subtree so dropping a deep chain never recurses.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Create a childless node.
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }

    // -- Field-style accessors ---------------------------------------------

    /// Identifier name, if this is an identifier.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Operator spelling for unary, binary, logical and assignment nodes.
    pub fn operator(&self) -> Option<&'static str> {
        match self.kind {
            NodeKind::Unary { operator }
            | NodeKind::Binary { operator }
            | NodeKind::Logical { operator }
            | NodeKind::Assignment { operator } => Some(operator),
            _ => None,
        }
    }

    /// Left operand (or assignment target) of a two-sided node.
    pub fn left(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Binary { .. } | NodeKind::Logical { .. } | NodeKind::Assignment { .. } => {
                self.children.first()
            }
            _ => None,
        }
    }

    /// Right operand (or assigned value) of a two-sided node.
    pub fn right(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Binary { .. } | NodeKind::Logical { .. } | NodeKind::Assignment { .. } => {
                self.children.get(1)
            }
            _ => None,
        }
    }

    /// Operand of a unary node.
    pub fn argument(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Unary { .. } => self.children.first(),
            _ => None,
        }
    }

    /// Initializer of a variable declarator.
    pub fn init(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::VariableDeclarator { has_init: true, .. } => self.children.last(),
            _ => None,
        }
    }

    /// Elements of a sequence expression; empty for every other kind.
    pub fn elements(&self) -> &[SyntaxNode] {
        match self.kind {
            NodeKind::Sequence => &self.children,
            _ => &[],
        }
    }

    /// Arguments of a call expression; empty for every other kind.
    pub fn arguments(&self) -> &[SyntaxNode] {
        match self.kind {
            NodeKind::Call if !self.children.is_empty() => &self.children[1..],
            _ => &[],
        }
    }

    /// The single expression of an expression or return statement.
    pub fn expression(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::ExpressionStatement | NodeKind::ReturnStatement => self.children.first(),
            _ => None,
        }
    }

    /// Literal value, if this is a literal.
    pub fn literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    // -- Predicates --------------------------------------------------------

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, NodeKind::Identifier(_))
    }

    pub fn is_unary(&self) -> bool {
        matches!(self.kind, NodeKind::Unary { .. })
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.kind, NodeKind::Binary { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence)
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, NodeKind::Assignment { .. })
    }

    /// Binary node with exactly this operator.
    pub fn is_binary_op(&self, op: &str) -> bool {
        matches!(self.kind, NodeKind::Binary { operator } if operator == op)
    }

    // -- Traversal ---------------------------------------------------------

    /// Iterate over this subtree in post-order: children before their parent,
    /// siblings left to right.
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder {
            stack: vec![(self, 0)],
        }
    }

    /// Total number of nodes in this subtree.
    pub fn size(&self) -> usize {
        self.post_order().count()
    }
}

/// Post-order iterator over a subtree. Uses an explicit stack, so walking a
/// deep chain costs heap rather than call stack.
pub struct PostOrder<'t> {
    stack: Vec<(&'t SyntaxNode, usize)>,
}

impl<'t> Iterator for PostOrder<'t> {
    type Item = &'t SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            let node = top.0;
            if let Some(child) = node.children.get(top.1) {
                top.1 += 1;
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(node);
            }
        }
        None
    }
}

/// A parsed script: the source text plus its lowered tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    root: SyntaxNode,
}

impl SyntaxTree {
    pub fn new(source: String, root: SyntaxNode) -> Self {
        Self { source, root }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Source text covered by `span`; empty if the span is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    /// Source text of a node.
    pub fn text(&self, node: &SyntaxNode) -> &str {
        self.slice(node.span)
    }

    /// All nodes in post-order, the order in which a completion callback
    /// would see them.
    pub fn nodes(&self) -> PostOrder<'_> {
        self.root.post_order()
    }
}
