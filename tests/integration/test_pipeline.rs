//! Full extraction runs over synthetic key-schedule scripts.

use roundkey::errors::{MAIN_ROUNDS, TABLE_GROUPS};
use roundkey::extractor::{extract_key, ExtractorConfig, OutputFormat, Round};
use roundkey::key::unpack_word;
use roundkey::parser::parse_script;
use roundkey::resolver::{resolve, BindingPolicy};

fn config() -> ExtractorConfig {
    ExtractorConfig {
        format: OutputFormat::Text,
        color: false,
        ..Default::default()
    }
}

/// `(i + 1) * 0x10000001` as a 32-bit word: 0x10000001, 0x20000002, ...
fn main_word(i: usize) -> i32 {
    ((i as u64 + 1) * 0x10000001) as u32 as i32
}

/// A script shaped like the obfuscated key schedule: first-round constants
/// and statement, one big-switch body holding the main-round xors and the
/// last-round masks, and the message entry point.
fn schedule_script() -> String {
    let mut src = String::new();
    src.push_str("var a = 1, b = 2, c = 3, d = 4;\n");
    for i in 0..52 {
        src.push_str(&format!("var k{i} = {};\n", main_word(i) as u32));
    }
    for i in 0..16 {
        src.push_str(&format!("var l{i} = {};\n", 1000 + i));
    }
    src.push_str("function first(m){ w0 = a ^ m[0], w1 = b ^ m[1], w2 = c ^ m[2], w3 = d ^ m[3]; }\n");

    let mut body: Vec<String> = (0..52).map(|i| format!("t = s ^ k{i}")).collect();
    body.extend((0..16).map(|i| format!("o{i} = 255 & (l{i} ^ s)")));
    src.push_str(&format!("function rounds(s){{ {}; }}\n", body.join(", ")));

    src.push_str("function send(msg){ return e = encrypt(msg, key), n = e.length, e; }\n");
    src
}

#[test]
fn test_first_round_declared_literals() {
    let src = "var a = 1, b = 2, c = 3, d = 4;\nx = a ^ m0, y = b ^ m1, z = c ^ m2, w = d ^ m3;";
    let r = extract_key(src, &config()).unwrap();
    assert_eq!(r.table.groups[0].words(), Some([1, 2, 3, 4]));
}

#[test]
fn test_complete_schedule() {
    let r = extract_key(&schedule_script(), &config()).unwrap();
    assert_eq!(r.table.len(), TABLE_GROUPS);
    assert!(r.table.is_complete(), "problems: {:?}", r.problems());
    assert!(r.problems().is_empty());

    for g in 0..MAIN_ROUNDS {
        let words = r.table.groups[g + 1].words().unwrap();
        let expected: Vec<i32> = (g * 4..g * 4 + 4).map(main_word).collect();
        assert_eq!(words.to_vec(), expected, "main group {g}");
    }
    assert_eq!(r.table.groups[14].words(), Some([1003, 1007, 1011, 1015]));

    let m = r.message.as_ref().unwrap();
    assert_eq!(m.name.as_deref(), Some("msg"));
}

#[test]
fn test_main_expressions_in_document_order() {
    let r = extract_key(&schedule_script(), &config()).unwrap();
    let names: Vec<String> = r
        .expressions(Round::Main)
        .iter()
        .map(|e| e.as_ref().unwrap().text())
        .collect();
    let expected: Vec<String> = (0..52).map(|i| format!("k{i}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_default_key_is_first_two_groups() {
    let r = extract_key(&schedule_script(), &config()).unwrap();
    assert_eq!(r.key.len(), 32);
    let words: Vec<u32> = r
        .key
        .as_bytes()
        .chunks(4)
        .map(|c| unpack_word([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(words, vec![1, 2, 3, 4, 0x10000001, 0x20000002, 0x30000003, 0x40000004]);
}

#[test]
fn test_full_width_key() {
    let cfg = ExtractorConfig {
        key_groups: TABLE_GROUPS,
        ..config()
    };
    let r = extract_key(&schedule_script(), &cfg).unwrap();
    assert_eq!(r.key.len(), TABLE_GROUPS * 16);
    assert_eq!(&r.key.as_bytes()[r.key.len() - 4..], &1015u32.to_be_bytes());
}

#[test]
fn test_no_big_switch_gives_short_table() {
    let src = "var a = 11, b = 22, c = 33, d = 44;\nx = a ^ m, y = b ^ m, z = c ^ m, w = d ^ m;";
    let r = extract_key(src, &config()).unwrap();
    assert!(r.table.main_rounds() < MAIN_ROUNDS);
    assert!(r.expressions(Round::Main).is_empty());
    assert_eq!(r.table.groups[0].words(), Some([11, 22, 33, 44]));
}

#[test]
fn test_no_entry_point_is_not_an_error() {
    let r = extract_key("var a = 1;", &config()).unwrap();
    assert!(r.message.is_none());
    assert!(r.problems().iter().any(|(at, _)| at == "message"));
}

#[test]
fn test_sticky_declarations_are_configurable() {
    let mut src = schedule_script();
    // a later redeclaration of k0 only counts when bindings are uniform
    src.push_str("function other(){ var k0 = 77; }\n");

    let sticky = extract_key(&src, &config()).unwrap();
    assert_eq!(sticky.table.groups[1].words().unwrap()[0], main_word(0));

    let uniform = ExtractorConfig {
        sticky_declarations: false,
        ..config()
    };
    let r = extract_key(&src, &uniform).unwrap();
    assert_eq!(r.table.groups[1].words().unwrap()[0], 77);
}

#[test]
fn test_resolver_idempotent_on_schedule() {
    let tree = parse_script(&schedule_script()).unwrap();
    let names: Vec<String> = (0..52).map(|i| format!("k{i}")).collect();
    let once = resolve(&tree, &names, BindingPolicy::StickyDeclarations);
    let twice = resolve(&tree, &names, BindingPolicy::StickyDeclarations);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 52);
}

#[test]
fn test_json_report() {
    let cfg = ExtractorConfig {
        format: OutputFormat::Json,
        ..config()
    };
    let r = extract_key(&schedule_script(), &cfg).unwrap();
    let json: serde_json::Value = serde_json::from_str(&r.text).unwrap();
    assert_eq!(json["complete"], true);
    assert_eq!(json["message"]["name"], "msg");
    assert_eq!(json["key"].as_array().unwrap().len(), 32);
    assert_eq!(json["table"].as_array().unwrap().len(), TABLE_GROUPS);
    assert_eq!(json["rounds"][1]["policy"], "sticky_declarations");
}

#[test]
fn test_last_round_stays_out_of_default_key_without_main_rounds() {
    let mut src = String::from("var a = 11, b = 22, c = 33, d = 44;\n");
    for i in 0..16 {
        src.push_str(&format!("var l{i} = {};\n", 1000 + i));
    }
    src.push_str("x = a ^ m, y = b ^ m, z = c ^ m, w = d ^ m;\n");
    let mut body: Vec<String> = (0..16).map(|i| format!("o{i} = 255 & (l{i} ^ s)")).collect();
    while body.len() < 52 {
        body.push("u = 0".to_string());
    }
    src.push_str(&format!("{};\n", body.join(", ")));

    let r = extract_key(&src, &config()).unwrap();
    assert_eq!(r.table.len(), TABLE_GROUPS);
    assert_eq!(r.table.main_rounds(), 0);
    assert_eq!(r.table.groups[TABLE_GROUPS - 1].words(), Some([1003, 1007, 1011, 1015]));
    assert!(r.table.groups[1].words().is_none());
    assert_eq!(
        r.key.to_hex(),
        "0000000b00000016000000210000002c00000000000000000000000000000000"
    );
}
