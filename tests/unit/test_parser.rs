//! Parser and lowered-tree tests.

use roundkey::errors::ParseError;
use roundkey::parser::parse_script;
use roundkey::syntax::{Literal, NodeKind};

#[test]
fn test_long_single_line_program() {
    let body = (0..2000).map(|i| format!("v{i}=v{i}^{i}")).collect::<Vec<_>>().join(",");
    let tree = parse_script(&format!("{body};")).unwrap();
    let seq = tree.nodes().find(|n| n.is_sequence()).unwrap();
    assert_eq!(seq.elements().len(), 2000);
}

#[test]
fn test_every_node_span_slices_source() {
    let src = "var a = 0x1f; b = -a ^ (c + 2);";
    let tree = parse_script(src).unwrap();
    for node in tree.nodes() {
        assert!(node.span.end <= src.len());
        assert!(node.span.start <= node.span.end);
    }
    let unary = tree.nodes().find(|n| n.is_unary()).unwrap();
    assert_eq!(tree.text(unary), "-a");
}

#[test]
fn test_literal_values() {
    let tree = parse_script("x = 0x10; y = 'str'; z = true; w = null;").unwrap();
    let lits: Vec<&Literal> = tree.nodes().filter_map(|n| n.literal()).collect();
    assert_eq!(lits.len(), 4);
    assert_eq!(lits[0].to_js_string().as_deref(), Some("16"));
    assert_eq!(lits[1].to_js_string().as_deref(), Some("str"));
    assert_eq!(lits[2].to_js_string().as_deref(), Some("true"));
    assert_eq!(lits[3].to_js_string(), None);
}

#[test]
fn test_post_order_children_first() {
    let tree = parse_script("a = b ^ c;").unwrap();
    let kinds: Vec<&NodeKind> = tree.nodes().map(|n| &n.kind).collect();
    let xor = kinds.iter().position(|k| matches!(k, NodeKind::Binary { operator: "^" })).unwrap();
    let assign = kinds.iter().position(|k| matches!(k, NodeKind::Assignment { .. })).unwrap();
    assert!(xor < assign);
    assert_eq!(kinds.last(), Some(&&NodeKind::Program));
}

#[test]
fn test_unicode_offsets_are_bytes() {
    let src = "var s = 'é'; k = 1;";
    let tree = parse_script(src).unwrap();
    let assign = tree.nodes().find(|n| n.is_assignment()).unwrap();
    assert_eq!(&src[assign.span.start..assign.span.end], "k = 1");
}

#[test]
fn test_syntax_error() {
    match parse_script("a = (;") {
        Err(ParseError::Syntax { diagnostics, .. }) => assert!(diagnostics >= 1),
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_whitespace_only() {
    assert!(matches!(parse_script(" \n\t "), Err(ParseError::EmptyScript)));
}
