//! Rules for label segments shared by the builder and the runtime decoder.
//!
//! Every stored word is terminated by a sentinel byte, so the label of the node
//! that completes a word always ends in the sentinel. Packed labels occupy a
//! fixed-width field that is NUL padded when shorter than the field and not
//! terminated at all when full, which is why every comparison here is bounded.

use std::cmp::Ordering;

use smallvec::SmallVec;

use super::error::BuilderError;

/// The sentinel used by the default layout.
pub const DEFAULT_SENTINEL: u8 = b'*';

/// Word text with its sentinel appended.
pub(crate) type WordBuf = SmallVec<[u8; 32]>;

/// Length of a label stored in a fixed-width field: up to the first NUL, or the
/// whole field when it is full.
#[inline]
pub fn stored_len(field: &[u8]) -> usize {
    field.iter().position(|&b| b == 0).unwrap_or(field.len())
}

/// The meaningful bytes of a fixed-width label field.
#[inline]
pub fn stored_label(field: &[u8]) -> &[u8] {
    &field[..stored_len(field)]
}

/// Returns true if `label` ends a word.
#[inline]
pub fn is_terminal(label: &[u8], sentinel: u8) -> bool {
    label.last() == Some(&sentinel)
}

/// Number of leading bytes `a` and `b` have in common.
#[inline]
pub fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Returns true if `label` is a prefix of `word[pos..]` followed by `sentinel`.
///
/// This is the bounded prefix test used by lookups, done without copying the
/// word to append the sentinel.
#[inline]
pub fn matches_at(label: &[u8], word: &[u8], pos: usize, sentinel: u8) -> bool {
    label.iter().enumerate().all(|(i, &b)| {
        let at = pos + i;
        match word.get(at) {
            Some(&c) => c == b,
            None => at == word.len() && b == sentinel,
        }
    })
}

/// Orders labels byte by byte with the sentinel ranked below every other byte.
///
/// A word therefore sorts before all of its extensions, which makes the
/// depth-first enumeration order the lexicographic order of the words.
pub fn compare(a: &[u8], b: &[u8], sentinel: u8) -> Ordering {
    let rank = |&byte: &u8| if byte == sentinel { 0u16 } else { u16::from(byte) + 1 };
    a.iter().map(rank).cmp(b.iter().map(rank))
}

/// Checks that `word` can be stored and returns it with the sentinel appended.
pub(crate) fn terminate(word: &[u8], sentinel: u8, max_len: usize) -> Result<WordBuf, BuilderError> {
    if word.len() > max_len {
        return Err(BuilderError::InputTooLong {
            word: String::from_utf8_lossy(word).into_owned(),
            len: word.len(),
            max: max_len,
        });
    }
    if let Some(&byte) = word.iter().find(|&&b| b == 0 || b == sentinel) {
        return Err(BuilderError::ReservedByte {
            word: String::from_utf8_lossy(word).into_owned(),
            byte,
        });
    }
    let mut text = WordBuf::with_capacity(word.len() + 1);
    text.extend_from_slice(word);
    text.push(sentinel);
    Ok(text)
}
