//! Key table and byte packing tests.

use roundkey::errors::{SlotError, MAIN_ROUNDS, TABLE_GROUPS};
use roundkey::key::*;

fn ok(words: impl IntoIterator<Item = i32>) -> Vec<Slot> {
    words.into_iter().map(Ok).collect()
}

#[test]
fn test_byte_round_trip() {
    let samples = [0, 1, -1, 255, 256, -256, i32::MAX, i32::MIN, 0x10000001, -0x2000_0002];
    for w in samples {
        let [b0, b1, b2, b3] = pack_word(w);
        let back = (u32::from(b0) << 24) | (u32::from(b1) << 16) | (u32::from(b2) << 8) | u32::from(b3);
        assert_eq!(back, w as u32, "word {w:#x}");
        assert_eq!(unpack_word([b0, b1, b2, b3]), w as u32);
    }
}

#[test]
fn test_main_rounds_partitioned_in_order() {
    let main: Vec<i32> = (1..=52).map(|i| i * 0x100).collect();
    let t = EncryptionKeyTable::assemble(ok([0; 4]), ok(main.clone()), ok([0; 4]));
    assert_eq!(t.len(), TABLE_GROUPS);
    for (g, chunk) in main.chunks(4).enumerate() {
        assert_eq!(t.groups[g + 1].words().unwrap().to_vec(), chunk.to_vec());
    }
}

#[test]
fn test_short_main_rounds() {
    let t = EncryptionKeyTable::assemble(ok([1; 4]), ok(0..10), ok([2; 4]));
    assert_eq!(t.main_rounds(), 3);
    assert!(t.main_rounds() < MAIN_ROUNDS);
    // the third main group only got two words
    assert!(!t.groups[3].is_complete());
    assert_eq!(t.groups.last().unwrap().words(), Some([2; 4]));
}

#[test]
fn test_default_width_is_two_groups() {
    let main: Vec<i32> = (0..52).collect();
    let t = EncryptionKeyTable::assemble(ok([0x01020304; 4]), ok(main), ok([7; 4]));
    let key = t.pack(DEFAULT_KEY_GROUPS);
    assert_eq!(key.len(), 32);
    assert_eq!(&key.as_bytes()[..4], &[1, 2, 3, 4]);
    assert_eq!(&key.as_bytes()[28..], &[0, 0, 0, 3]);
}

#[test]
fn test_full_width_packs_every_group() {
    let main: Vec<i32> = (0..52).collect();
    let t = EncryptionKeyTable::assemble(ok([0; 4]), ok(main), ok([-1; 4]));
    let key = t.pack(TABLE_GROUPS);
    assert_eq!(key.len(), TABLE_GROUPS * 16);
    assert_eq!(&key.as_bytes()[key.len() - 4..], &[0xff; 4]);
}

#[test]
fn test_invalid_slots_listed_and_zeroed() {
    let first = vec![
        Ok(1),
        Err(SlotError::UnresolvedVariable("x".to_string())),
        Ok(3),
        Ok(4),
    ];
    let t = EncryptionKeyTable::assemble(first, vec![], ok([5; 4]));
    let invalid: Vec<_> = t.invalid_slots().into_iter().filter(|(g, _, _)| *g == 0).collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].1, 1);
    assert_eq!(&t.pack(1).as_bytes()[4..8], &[0, 0, 0, 0]);
}

#[test]
fn test_table_display() {
    let t = EncryptionKeyTable::assemble(ok([1, 2, 3, 4]), vec![], ok([-1; 4]));
    let text = t.to_string();
    assert!(text.contains("first: 0x00000001 0x00000002"));
    assert!(text.contains("last: 0xffffffff"));
}

#[test]
fn test_last_round_pinned_to_final_group() {
    for main_words in [0, 4, 10, 52] {
        let t = EncryptionKeyTable::assemble(ok([1; 4]), ok(0..main_words), ok([9; 4]));
        assert_eq!(t.len(), TABLE_GROUPS, "{main_words} main words");
        assert_eq!(t.groups[TABLE_GROUPS - 1].words(), Some([9; 4]));
    }
}

#[test]
fn test_missing_main_rounds_pack_as_zeros() {
    let t = EncryptionKeyTable::assemble(ok([11, 22, 33, 44]), vec![], ok([1003, 1007, 1011, 1015]));
    let key = t.pack(DEFAULT_KEY_GROUPS);
    assert_eq!(&key.as_bytes()[16..32], &[0u8; 16]);
    assert!(!key.to_hex().contains("000003eb"));
}
