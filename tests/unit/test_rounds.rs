//! Round extractor tests on synthetic key schedules.

use roundkey::errors::SlotError;
use roundkey::expr::RoundKeyExpression;
use roundkey::parser::parse_script;
use roundkey::rounds::*;

fn big_body(mut elements: Vec<String>) -> String {
    while elements.len() <= 50 {
        elements.push("z = 0".to_string());
    }
    format!("{};", elements.join(","))
}

#[test]
fn test_first_round_shapes() {
    let src = "a = -qX ^ m[0], b = Vb ^ m[1], c = (p + 3) ^ m[2], d = ~r ^ m[3];";
    let tree = parse_script(src).unwrap();
    let texts: Vec<String> = extract_first_round(&tree).iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["-qX", "Vb", "p", "~r"]);
}

#[test]
fn test_first_round_unary_over_binary() {
    let src = "a = -(qX + 3) ^ m, b = -(qX + 3 - y) ^ m, c = 1, d = 2;";
    let tree = parse_script(src).unwrap();
    let exprs = extract_first_round(&tree);
    assert_eq!(exprs[0], RoundKeyExpression::signed("-", "qX"));
    assert_eq!(exprs[1], RoundKeyExpression::source("qX + 3 - y"));
    assert_eq!(exprs.len(), 2);
}

#[test]
fn test_first_round_keeps_first_four_across_groups() {
    let src = "a = k1 ^ m, b = k2 ^ m, c = k3 ^ m, d = 0;\n\
               e = k4 ^ m, f = k5 ^ m, g = 0, h = 0;";
    let tree = parse_script(src).unwrap();
    let texts: Vec<String> = extract_first_round(&tree).iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["k1", "k2", "k3", "k4"]);
}

#[test]
fn test_main_rounds_document_order() {
    let steps = (0..52).map(|i| format!("t{i} = s ^ k{i}")).collect();
    let tree = parse_script(&big_body(steps)).unwrap();
    let exprs = extract_main_rounds(&tree);
    assert_eq!(exprs.len(), 52);
    assert_eq!(exprs[0].text(), "k0");
    assert_eq!(exprs[51].text(), "k51");
}

#[test]
fn test_main_rounds_need_big_switch() {
    let tree = parse_script("t = s ^ k0, u = s ^ k1;").unwrap();
    assert!(extract_main_rounds(&tree).is_empty());
}

#[test]
fn test_last_round_sampling() {
    let mut steps = Vec::new();
    for i in 0..16 {
        steps.push(format!("o{i} = 255 & (l{i} ^ s)"));
    }
    let tree = parse_script(&big_body(steps)).unwrap();
    let texts: Vec<String> = extract_last_round(&tree)
        .into_iter()
        .map(|r| r.unwrap().text())
        .collect();
    assert_eq!(texts, vec!["l3", "l7", "l11", "l15"]);
}

#[test]
fn test_last_round_missing_slots_do_not_shift() {
    let mut steps = Vec::new();
    for i in 0..16 {
        let operand = if i == 7 { "0x10".to_string() } else { format!("l{i}") };
        steps.push(format!("o{i} = 255 & ({operand} ^ s)"));
    }
    let tree = parse_script(&big_body(steps)).unwrap();
    let out = extract_last_round(&tree);
    assert!(matches!(out[1], Err(SlotError::ShapeNotFound(_))));
    assert_eq!(out[2].as_ref().unwrap().text(), "l11");
}

#[test]
fn test_message_descriptor() {
    let src = "var x = 1;\nfunction send(msg){ return e = encrypt(msg, key), n = e.length, e; }";
    let tree = parse_script(src).unwrap();
    let m = locate_message(&tree).unwrap();
    assert_eq!(m.name.as_deref(), Some("msg"));
    assert!(src[m.start..m.end].starts_with("return e = encrypt"));
}

#[test]
fn test_no_message() {
    let tree = parse_script("function f(){ return 1; }").unwrap();
    assert!(locate_message(&tree).is_none());
}
