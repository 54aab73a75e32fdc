//! Script parsing.
//!
//! Parses the target script with oxc and lowers the result into an owned
//! [`SyntaxTree`]. The lowering keeps every expression as a node and drops
//! statement-level scaffolding (blocks, functions, loops) the key pipeline
//! never inspects; their contents attach to the nearest kept ancestor, so a
//! post-order walk still sees every expression in document order.

use crate::errors::ParseError;
use crate::syntax::{Literal, NodeKind, Span, SyntaxNode, SyntaxTree};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentTarget, Expression, ExpressionStatement, Program, ReturnStatement,
    VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{GetSpan, SourceType};

/// Deepest expression nesting the lowering accepts.
pub const MAX_NESTING: usize = 32_000;

/// Stack for the parser thread. Parsing and lowering recurse once per
/// nesting level; this covers [`MAX_NESTING`] with room to spare.
const PARSER_STACK_BYTES: usize = 1024 * 1024 * 1024;

/// Parse `source` into a lowered syntax tree.
///
/// Any diagnostic from the parser is fatal: every later pass depends on a
/// faithful tree, so a partially recovered one is never returned. Parsing
/// runs on a dedicated thread with a large stack so long minified chains
/// cannot exhaust the caller's.
pub fn parse_script(source: &str) -> Result<SyntaxTree, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::EmptyScript);
    }

    std::thread::scope(|scope| -> Result<SyntaxTree, ParseError> {
        let handle = std::thread::Builder::new()
            .name("roundkey-parser".to_string())
            .stack_size(PARSER_STACK_BYTES)
            .spawn_scoped(scope, || parse_on_current_thread(source))
            .map_err(|e| ParseError::Worker(e.to_string()))?;
        handle
            .join()
            .map_err(|_| ParseError::Worker("parser thread panicked".to_string()))?
    })
}

fn parse_on_current_thread(source: &str) -> Result<SyntaxTree, ParseError> {
    let allocator = Allocator::default();
    let options = ParseOptions {
        preserve_parens: false,
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    let ret = Parser::new(&allocator, source, SourceType::default().with_script(true))
        .with_options(options)
        .parse();

    if let Some(first) = ret.errors.first() {
        return Err(ParseError::Syntax {
            message: first.to_string(),
            diagnostics: ret.errors.len(),
        });
    }
    if ret.panicked {
        return Err(ParseError::Panicked(ret.errors.len()));
    }

    let root = lower_program(&ret.program)?;
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("lowered script into {} nodes", root.size());
    }
    Ok(SyntaxTree::new(source.to_string(), root))
}

fn lower_program(program: &Program<'_>) -> Result<SyntaxNode, ParseError> {
    let mut lowering = Lowering::default();
    lowering.open();
    lowering.visit_program(program);
    if lowering.too_deep {
        return Err(ParseError::TooDeep { limit: MAX_NESTING });
    }
    let children = lowering.frames.pop().unwrap_or_default();
    Ok(SyntaxNode::new(NodeKind::Program, span_of(program.span), children))
}

fn span_of(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

/// Builds the owned tree with a stack of child lists: each kept node opens a
/// frame before walking its children and closes it afterwards.
/// Past [`MAX_NESTING`] open frames it stops descending and flags the tree
/// as too deep.
#[derive(Default)]
struct Lowering {
    frames: Vec<Vec<SyntaxNode>>,
    too_deep: bool,
}

impl Lowering {
    fn open(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Whether another level may be opened.
    fn can_descend(&mut self) -> bool {
        if self.too_deep || self.frames.len() > MAX_NESTING {
            self.too_deep = true;
            return false;
        }
        true
    }

    fn close(&mut self, kind: NodeKind, span: oxc_span::Span) {
        let children = self.frames.pop().unwrap_or_default();
        let node = SyntaxNode::new(kind, span_of(span), children);
        if let Some(parent) = self.frames.last_mut() {
            parent.push(node);
        }
    }
}

impl<'a> Visit<'a> for Lowering {
    fn visit_expression(&mut self, it: &Expression<'a>) {
        if !self.can_descend() {
            return;
        }
        self.open();
        walk::walk_expression(self, it);
        self.close(expression_kind(it), it.span());
    }

    fn visit_assignment_target(&mut self, it: &AssignmentTarget<'a>) {
        if !self.can_descend() {
            return;
        }
        self.open();
        walk::walk_assignment_target(self, it);
        let kind = match it {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                NodeKind::Identifier(id.name.to_string())
            }
            _ => NodeKind::Other,
        };
        self.close(kind, it.span());
    }

    fn visit_return_statement(&mut self, it: &ReturnStatement<'a>) {
        if !self.can_descend() {
            return;
        }
        self.open();
        walk::walk_return_statement(self, it);
        self.close(NodeKind::ReturnStatement, it.span);
    }

    fn visit_expression_statement(&mut self, it: &ExpressionStatement<'a>) {
        if !self.can_descend() {
            return;
        }
        self.open();
        walk::walk_expression_statement(self, it);
        self.close(NodeKind::ExpressionStatement, it.span);
    }

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        if !self.can_descend() {
            return;
        }
        self.open();
        walk::walk_variable_declarator(self, it);
        let kind = NodeKind::VariableDeclarator {
            name: it.id.get_binding_identifier().map(|id| id.name.to_string()),
            has_init: it.init.is_some(),
        };
        self.close(kind, it.span);
    }
}

fn expression_kind(expr: &Expression<'_>) -> NodeKind {
    match expr {
        Expression::Identifier(id) => NodeKind::Identifier(id.name.to_string()),
        Expression::NumericLiteral(lit) => NodeKind::Literal(Literal::Number(lit.value)),
        Expression::StringLiteral(lit) => NodeKind::Literal(Literal::String(lit.value.to_string())),
        Expression::BooleanLiteral(lit) => NodeKind::Literal(Literal::Boolean(lit.value)),
        Expression::NullLiteral(_) => NodeKind::Literal(Literal::Null),
        Expression::UnaryExpression(e) => NodeKind::Unary {
            operator: e.operator.as_str(),
        },
        Expression::BinaryExpression(e) => NodeKind::Binary {
            operator: e.operator.as_str(),
        },
        Expression::LogicalExpression(e) => NodeKind::Logical {
            operator: e.operator.as_str(),
        },
        Expression::AssignmentExpression(e) => NodeKind::Assignment {
            operator: e.operator.as_str(),
        },
        Expression::SequenceExpression(_) => NodeKind::Sequence,
        Expression::CallExpression(_) => NodeKind::Call,
        _ => NodeKind::Other,
    }
}
