//! Turkish-aware case folding and collation.
//!
//! Catalog names are Turkish, so plain Unicode lowercasing is wrong for the
//! dotted and dotless I: `I` folds to `ı` and `İ` folds to `i`.

use std::cmp::Ordering;

const ALPHABET: &str = "abcçdefgğhıijklmnoöprsştuüvyz";

/// Lowercase `text` using Turkish rules.
pub fn fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'I' => folded.push('ı'),
            'İ' => folded.push('i'),
            _ => folded.extend(c.to_lowercase()),
        }
    }
    folded
}

/// True when the already-folded `needle` occurs in `haystack` after folding.
pub fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    folded_needle.is_empty() || fold(haystack).contains(folded_needle)
}

/// Sort weight of a folded character: ASCII non-letters, then the Turkish
/// alphabet in order, then everything else by code point.
fn weight(c: char) -> (u8, u32) {
    if let Some(position) = ALPHABET.chars().position(|letter| letter == c) {
        return (1, position as u32);
    }
    if c.is_ascii() && !c.is_ascii_alphabetic() {
        (0, c as u32)
    } else {
        (2, c as u32)
    }
}

/// Compare two strings case-insensitively in Turkish alphabetical order.
pub fn collate(a: &str, b: &str) -> Ordering {
    let a = fold(a);
    let b = fold(b);
    a.chars().map(weight).cmp(b.chars().map(weight))
}
