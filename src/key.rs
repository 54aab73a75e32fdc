//! Key assembly.
//!
//! Evaluated round words are laid out in an [`EncryptionKeyTable`] (first
//! round, main rounds, last round) and a prefix of that table is packed
//! big-endian into a [`ByteKey`].

use crate::errors::{SlotError, MAIN_ROUNDS, TABLE_GROUPS, WORDS_PER_GROUP};
use crate::utils::helpers::word_hex;
use serde::Serialize;
use std::fmt;

/// One table slot: an evaluated word or the reason it is missing.
pub type Slot = Result<i32, SlotError>;

/// Number of groups the legacy tool packs into the byte key.
pub const DEFAULT_KEY_GROUPS: usize = 2;

/// Four consecutive round words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundGroup {
    pub slots: [Slot; WORDS_PER_GROUP],
}

impl RoundGroup {
    /// Build a group from up to four slots. Missing positions become
    /// [`SlotError::ShapeNotFound`]; extras are dropped.
    pub fn from_slots(slots: impl IntoIterator<Item = Slot>) -> Self {
        let mut it = slots.into_iter();
        let slots = std::array::from_fn(|i| {
            it.next()
                .unwrap_or_else(|| Err(SlotError::ShapeNotFound(format!("word {i} not extracted"))))
        });
        Self { slots }
    }

    /// Every slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Result::is_ok)
    }

    /// The four words, if the group is complete.
    pub fn words(&self) -> Option<[i32; WORDS_PER_GROUP]> {
        let mut out = [0; WORDS_PER_GROUP];
        for (dst, slot) in out.iter_mut().zip(&self.slots) {
            *dst = *slot.as_ref().ok()?;
        }
        Some(out)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.slots
                .iter()
                .map(|slot| match slot {
                    Ok(w) => serde_json::json!(w),
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                })
                .collect(),
        )
    }
}

/// Split a word into four bytes, most significant first.
pub fn pack_word(word: i32) -> [u8; 4] {
    [24, 16, 8, 0].map(|shift| ((word >> shift) & 0xff) as u8)
}

/// Reassemble four big-endian bytes into the word's unsigned value.
pub fn unpack_word(bytes: [u8; 4]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// The round-key table: first round, main rounds, last round.
///
/// Always 15 groups: group 0 is the first round, groups 1 to 13 the main
/// rounds and group 14 the last round. Main groups the script did not yield
/// are filled with [`SlotError::ShapeNotFound`] slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKeyTable {
    pub groups: Vec<RoundGroup>,
    main_extracted: usize,
}

impl EncryptionKeyTable {
    /// Lay out extracted slots. `main` is split into groups of four in order,
    /// at most [`MAIN_ROUNDS`] of them; a trailing partial group is padded,
    /// and so is every main round with no slots at all.
    pub fn assemble(first: Vec<Slot>, main: Vec<Slot>, last: Vec<Slot>) -> Self {
        let mut groups = Vec::with_capacity(TABLE_GROUPS);
        groups.push(RoundGroup::from_slots(first));

        let mut main = main.into_iter().peekable();
        let mut main_extracted = 0;
        for round in 1..=MAIN_ROUNDS {
            if main.peek().is_some() {
                groups.push(RoundGroup::from_slots(main.by_ref().take(WORDS_PER_GROUP)));
                main_extracted += 1;
            } else {
                let missing = (0..WORDS_PER_GROUP).map(|_| {
                    Err(SlotError::ShapeNotFound(format!("main round {round} not extracted")))
                });
                groups.push(RoundGroup::from_slots(missing));
            }
        }
        if main.next().is_some() {
            log::warn!("more than {MAIN_ROUNDS} main round groups, extra words dropped");
        }

        groups.push(RoundGroup::from_slots(last));
        log::debug!("key table assembled, {main_extracted}/{MAIN_ROUNDS} main rounds extracted");
        Self {
            groups,
            main_extracted,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of main-round groups the script actually yielded.
    pub fn main_rounds(&self) -> usize {
        self.main_extracted
    }

    /// The last-round group.
    pub fn last_round(&self) -> Option<&RoundGroup> {
        self.groups.get(TABLE_GROUPS - 1)
    }

    /// Every group is present and every slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.groups.len() == TABLE_GROUPS && self.groups.iter().all(RoundGroup::is_complete)
    }

    /// `(group, word, error)` for every slot without a value.
    pub fn invalid_slots(&self) -> Vec<(usize, usize, &SlotError)> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .slots
                    .iter()
                    .enumerate()
                    .filter_map(move |(w, slot)| slot.as_ref().err().map(|e| (g, w, e)))
            })
            .collect()
    }

    /// Pack the first `width` groups big-endian. `width` is clamped to the
    /// table length. An invalid slot packs as four zero bytes.
    pub fn pack(&self, width: usize) -> ByteKey {
        let width = width.min(self.groups.len());
        let mut bytes = Vec::with_capacity(width * WORDS_PER_GROUP * 4);
        for (g, group) in self.groups[..width].iter().enumerate() {
            for (w, slot) in group.slots.iter().enumerate() {
                match slot {
                    Ok(word) => bytes.extend_from_slice(&pack_word(*word)),
                    Err(e) => {
                        log::warn!("key word {g}.{w} packed as zero: {e}");
                        bytes.extend_from_slice(&[0; 4]);
                    }
                }
            }
        }
        ByteKey(bytes)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.groups.iter().map(RoundGroup::to_json).collect())
    }
}

impl fmt::Display for EncryptionKeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.groups.len().saturating_sub(1);
        for (g, group) in self.groups.iter().enumerate() {
            let label = match g {
                0 => "first".to_string(),
                g if g == last => "last".to_string(),
                g => format!("main {g:>2}"),
            };
            let cells: Vec<String> = group
                .slots
                .iter()
                .map(|slot| match slot {
                    Ok(w) => word_hex(*w),
                    Err(_) => "----------".to_string(),
                })
                .collect();
            writeln!(f, "{label:>7}: {}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Packed key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ByteKey(pub Vec<u8>);

impl ByteKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for ByteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
