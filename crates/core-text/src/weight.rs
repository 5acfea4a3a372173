//! Visual weight of lyric text.
//!
//! A capsule chip has a fixed width, and the glyphs of the wide East Asian
//! scripts occupy roughly twice the advance of a Latin letter. Every layout
//! decision in the marquee is therefore made in *weight units* rather than
//! code point counts:
//!
//! * CJK Unified Ideographs (base block, extension A, extension B),
//!   CJK Compatibility Ideographs, Hiragana, Katakana and Hangul Syllables
//!   weigh 2.
//! * Everything else (Latin, digits, punctuation, symbols, other scripts)
//!   weighs 1.
//!
//! The classification is a handful of range checks on purpose: it must stay
//! stable across Unicode versions so a given lyric always scrolls the same way.

const CJK_UNIFIED: (char, char) = ('\u{4E00}', '\u{9FFF}');
const CJK_EXT_A: (char, char) = ('\u{3400}', '\u{4DBF}');
const CJK_EXT_B: (char, char) = ('\u{20000}', '\u{2A6DF}');
const CJK_COMPAT: (char, char) = ('\u{F900}', '\u{FAFF}');
const HIRAGANA: (char, char) = ('\u{3040}', '\u{309F}');
const KATAKANA: (char, char) = ('\u{30A0}', '\u{30FF}');
const HANGUL_SYLLABLES: (char, char) = ('\u{AC00}', '\u{D7AF}');

const WIDE_BLOCKS: [(char, char); 7] = [
    CJK_UNIFIED,
    CJK_EXT_A,
    CJK_EXT_B,
    CJK_COMPAT,
    HIRAGANA,
    KATAKANA,
    HANGUL_SYLLABLES,
];

/// Weight of a narrow code point.
pub const NARROW_WEIGHT: usize = 1;
/// Weight of a wide-script code point.
pub const WIDE_WEIGHT: usize = 2;

/// True when `c` belongs to one of the wide scripts.
#[inline]
pub fn is_wide(c: char) -> bool {
    WIDE_BLOCKS.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

/// Weight of a single code point: 2 for wide scripts, 1 otherwise.
#[inline]
pub fn char_weight(c: char) -> usize {
    if is_wide(c) { WIDE_WEIGHT } else { NARROW_WEIGHT }
}

/// Sum of the code point weights of `text`. The empty string weighs 0.
pub fn total_weight(text: &str) -> usize {
    text.chars().map(char_weight).sum()
}

/// Iterate `(byte_offset, char, weight)` triples of `text`.
pub(crate) fn weighted(text: &str) -> impl Iterator<Item = (usize, char, usize)> + '_ {
    text.char_indices().map(|(i, c)| (i, c, char_weight(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(total_weight(""), 0);
    }

    #[test]
    fn ascii_is_one_per_char() {
        assert_eq!(total_weight("ABC"), 3);
    }

    #[test]
    fn cjk_pair() {
        assert_eq!(total_weight("你好"), 4);
    }

    #[test]
    fn mixed_run() {
        assert_eq!(total_weight("A你B"), 4);
    }

    #[test]
    fn kana_and_hangul_are_wide() {
        assert_eq!(char_weight('あ'), 2);
        assert_eq!(char_weight('カ'), 2);
        assert_eq!(char_weight('한'), 2);
    }

    #[test]
    fn extension_blocks_are_wide() {
        assert_eq!(char_weight('\u{3400}'), 2);
        assert_eq!(char_weight('\u{20000}'), 2);
        assert_eq!(char_weight('\u{F900}'), 2);
    }

    #[test]
    fn fullwidth_punctuation_and_emoji_are_narrow() {
        // Only the listed blocks widen; CJK punctuation and emoji stay at 1.
        assert_eq!(char_weight('，'), 1);
        assert_eq!(char_weight('。'), 1);
        assert_eq!(char_weight('😀'), 1);
    }

    #[test]
    fn decomposed_jamo_are_narrow() {
        assert_eq!(char_weight('\u{1100}'), 1);
    }
}
