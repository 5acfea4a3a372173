//! Scroll step planning.
//!
//! Each scroll step advances the cursor by a small amount of weight. The
//! planner peeks at the next few weight units and picks a step that reads
//! naturally for the dominant script of that lookahead:
//!
//! * CJK: two glyphs per step (usually 4 weight). Dense glyphs read at about
//!   the pace of three or four Latin letters.
//! * Western: up to and including a space found at code point index 2..=4 so
//!   words are not split, otherwise three code points.

use crate::weight::{char_weight, is_wide, total_weight};
use crate::window::extract_by_weight;

/// Dominant script of a lookahead segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Cjk,
    Western,
}

impl Script {
    /// CJK when strictly more than half the code points are wide.
    pub fn classify(segment: &str) -> Self {
        let (wide, total) = segment
            .chars()
            .fold((0usize, 0usize), |(w, t), c| (w + is_wide(c) as usize, t + 1));
        if wide * 2 > total {
            Script::Cjk
        } else {
            Script::Western
        }
    }
}

/// Chooses how far to advance the scroll cursor on each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPlanner {
    /// Weight budget of the lookahead segment.
    pub lookahead: usize,
    /// Step used when nothing is left to look at, or a CJK segment is a single glyph.
    pub default_shift: usize,
    /// Step used for a Western segment shorter than three code points.
    pub short_western_shift: usize,
}

impl Default for ShiftPlanner {
    fn default() -> Self {
        Self {
            lookahead: 10,
            default_shift: 4,
            short_western_shift: 3,
        }
    }
}

impl ShiftPlanner {
    /// Earliest and latest code point index accepted as a word break.
    const BREAK_WINDOW: std::ops::RangeInclusive<usize> = 2..=4;
    const CJK_STEP_CHARS: usize = 2;
    const WESTERN_STEP_CHARS: usize = 3;

    /// Weight to advance from `offset`. Always positive.
    pub fn next_shift(&self, text: &str, offset: usize) -> usize {
        let segment = extract_by_weight(text, offset, self.lookahead);
        if segment.is_empty() {
            return self.default_shift;
        }
        match Script::classify(segment) {
            Script::Cjk => self.cjk_shift(segment),
            Script::Western => self.western_shift(segment),
        }
    }

    fn cjk_shift(&self, segment: &str) -> usize {
        if segment.chars().count() < Self::CJK_STEP_CHARS {
            return self.default_shift;
        }
        segment.chars().take(Self::CJK_STEP_CHARS).map(char_weight).sum()
    }

    fn western_shift(&self, segment: &str) -> usize {
        let space_at = segment
            .chars()
            .enumerate()
            .skip(*Self::BREAK_WINDOW.start())
            .find(|&(_, c)| c == ' ')
            .map(|(i, _)| i);
        if let Some(i) = space_at.filter(|i| Self::BREAK_WINDOW.contains(i)) {
            return segment.chars().take(i + 1).map(char_weight).sum();
        }
        if segment.chars().count() >= Self::WESTERN_STEP_CHARS {
            let head_end = segment
                .char_indices()
                .nth(Self::WESTERN_STEP_CHARS)
                .map_or(segment.len(), |(b, _)| b);
            return total_weight(&segment[..head_end]);
        }
        self.short_western_shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(text: &str, offset: usize) -> usize {
        ShiftPlanner::default().next_shift(text, offset)
    }

    #[test]
    fn cjk_advances_two_glyphs() {
        assert_eq!(shift("一二三四五六七八九十", 0), 4);
    }

    #[test]
    fn cjk_step_sums_the_leading_glyphs() {
        // Three of four glyphs are wide, so the segment is CJK; the step
        // covers "你a" only.
        assert_eq!(shift("你a好好", 0), 3);
    }

    #[test]
    fn empty_lookahead_uses_default() {
        assert_eq!(shift("abc", 10), 4);
        assert_eq!(shift("", 0), 4);
    }

    #[test]
    fn single_cjk_glyph_uses_default() {
        assert_eq!(shift("abcdef你", 6), 4);
    }

    #[test]
    fn western_prefers_word_break() {
        // Space at index 2 => "ab " weight 3.
        assert_eq!(shift("ab cdefgh", 0), 3);
        // Space at index 4 => "abcd " weight 5.
        assert_eq!(shift("abcd efgh", 0), 5);
    }

    #[test]
    fn western_space_too_early_or_late_is_ignored() {
        // Space at index 1 is before the break window; next space at 6 is after it.
        assert_eq!(shift("a bcdef gh", 0), 3);
        assert_eq!(shift("abcdefgh ij", 0), 3);
    }

    #[test]
    fn western_short_segment_falls_back() {
        assert_eq!(shift("xyzab", 3), 3);
    }

    #[test]
    fn western_head_with_wide_glyph_counts_weight() {
        // One wide glyph among Latin letters stays Western-dominant.
        assert_eq!(shift("a你bcdef", 0), 4);
    }

    #[test]
    fn classify_majority() {
        assert_eq!(Script::classify("你好a"), Script::Cjk);
        assert_eq!(Script::classify("你a"), Script::Western);
        assert_eq!(Script::classify("你"), Script::Cjk);
        assert_eq!(Script::classify("abc"), Script::Western);
    }
}
