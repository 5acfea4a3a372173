//! Lyric normalization adapter.
//!
//! Producers hand over lyric lines in whatever form the source app stored
//! them. Decomposed Hangul (conjoining jamo) would weigh 1 per jamo while the
//! composed syllable weighs 2, so every line is brought to NFC before it is
//! measured or compared. Trailing line terminators from line-oriented inputs
//! are dropped; interior whitespace is preserved because the shift planner
//! keys off spaces.

use unicode_normalization::UnicodeNormalization;

/// NFC-normalize `input` and strip trailing `\r` / `\n`.
pub fn normalize_lyric(input: &str) -> String {
    input
        .trim_end_matches(['\r', '\n'])
        .nfc()
        .collect()
}
