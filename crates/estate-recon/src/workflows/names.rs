//! Canonical comparable form for deceased names.
//!
//! Gazette typesetting and registry clerks disagree on casing, accents,
//! honorifics, punctuation, and word order. Everything here reduces a raw name
//! to lower-case ASCII word tokens so both sides compare as token sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const HONORIFICS: &[&str] = &["dr", "mr", "mrs", "ms", "miss", "rev", "prof", "eng"];

/// Word sequences that introduce a name rather than belong to it. Checked in
/// order at every position, so a longer phrase must not share a first word
/// with a shorter one listed before it.
const ESTATE_PHRASES: &[&[&str]] = &[
    &["the", "late"],
    &["late"],
    &["estate", "of"],
    &["of", "the", "estate", "of"],
];

/// A name reduced to its comparable form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalName {
    /// Space-joined tokens in their original order.
    pub canonical: String,
    /// Space-joined tokens sorted alphabetically, duplicates kept.
    pub sorted: String,
    /// Unordered token set consumed by similarity scoring.
    pub tokens: BTreeSet<String>,
}

impl CanonicalName {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Canonicalize a raw name. Total for any input: garbage yields an empty name.
pub fn canonicalize(raw: &str) -> CanonicalName {
    let folded = fold_to_ascii_words(raw);
    let mut words: Vec<&str> = folded
        .split_whitespace()
        .filter(|word| !HONORIFICS.contains(word))
        .collect();

    strip_estate_phrases(&mut words);
    strip_trailing_place(&mut words);

    let canonical = words.join(" ");
    let mut sorted_words = words.clone();
    sorted_words.sort_unstable();
    let sorted = sorted_words.join(" ");
    let tokens = words.iter().map(|word| (*word).to_string()).collect();

    CanonicalName {
        canonical,
        sorted,
        tokens,
    }
}

/// Lower-case, drop diacritics, and turn every run of characters outside
/// `[a-z\s]` into a single space.
fn fold_to_ascii_words(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    let mut in_gap = false;

    for ch in raw.to_lowercase().nfd().filter(|ch| !is_combining_mark(*ch)) {
        if ch.is_ascii_lowercase() || ch.is_whitespace() {
            folded.push(ch);
            in_gap = false;
        } else if !in_gap {
            folded.push(' ');
            in_gap = true;
        }
    }

    folded
}

/// Removing one phrase can splice together the words of another
/// ("the the late late"), so sweep until nothing matches.
fn strip_estate_phrases(words: &mut Vec<&str>) {
    loop {
        let mut kept = Vec::with_capacity(words.len());
        let mut index = 0;
        let mut removed = false;

        while index < words.len() {
            let rest = &words[index..];
            match ESTATE_PHRASES
                .iter()
                .find(|phrase| rest.starts_with(phrase))
            {
                Some(phrase) => {
                    index += phrase.len();
                    removed = true;
                }
                None => {
                    kept.push(words[index]);
                    index += 1;
                }
            }
        }

        *words = kept;
        if !removed {
            break;
        }
    }
}

/// Location suffixes ("of Nairobi", "of Kisumu County") leak into printed
/// names; everything from the first `of` that is followed by another word is
/// dropped.
fn strip_trailing_place(words: &mut Vec<&str>) {
    if let Some(position) = words
        .iter()
        .enumerate()
        .position(|(index, word)| *word == "of" && index + 1 < words.len())
    {
        words.truncate(position);
    }
}
