//! Text canonicalization for duplicate detection and banned-word matching
//!
//! Two hints that differ only in case, punctuation, accents, spacing or stretched
//! letters ("Spicy!", "spicy", "SPIICY!!!") normalize to the same string.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize user text. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    // Decompose accented letters and drop the marks: "é" -> "e"
    let unaccented: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let kept: String = unaccented
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace() || is_emoji(*c))
        .collect();

    let spaced = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    collapse_repeats(&spaced)
}

/// Find the first banned word contained in already-normalized text.
///
/// Banned words go through the same pipeline so "speed" still matches a hint
/// that normalized to "sped".
pub fn find_banned<'a>(normalized: &str, banned: &'a [String]) -> Option<&'a str> {
    banned
        .iter()
        .find(|word| {
            let needle = normalize(word);
            !needle.is_empty() && normalized.contains(&needle)
        })
        .map(String::as_str)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF // pictographs, emoticons, transport, symbols & extended-A
        | 0x2600..=0x27BF // misc symbols, dingbats
        | 0x2B00..=0x2BFF // arrows, stars
        | 0x200D          // zero width joiner inside emoji sequences
    )
}

/// Collapse every run of identical characters to a single one
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last: Option<char> = None;
    for c in text.chars() {
        if last != Some(c) {
            out.push(c);
        }
        last = Some(c);
    }
    out
}
