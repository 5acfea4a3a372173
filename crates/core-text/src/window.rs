//! Weight-addressed windows into a lyric line.
//!
//! Contract:
//! - `start_weight` is a cursor in weight units. The window begins at the
//!   first code point whose preceding weight is `>= start_weight`, so a cursor
//!   that lands inside a wide glyph snaps forward to the next glyph.
//! - The window grows while its accumulated weight stays `<= max_weight`; a
//!   wide glyph that would overflow the budget is left out.
//! - A cursor at or past the end, or a zero budget, yields `""`.
//!
//! The returned slice borrows from the input; nothing is allocated.

use crate::weight::weighted;

/// Byte offset of the first code point at or after `start_weight`, or `None`
/// when the cursor is past the last code point.
fn start_byte(text: &str, start_weight: usize) -> Option<usize> {
    let mut acc = 0usize;
    for (byte, _c, w) in weighted(text) {
        if acc >= start_weight {
            return Some(byte);
        }
        acc += w;
    }
    None
}

/// Extract the substring starting at weight `start_weight` whose total weight
/// does not exceed `max_weight`.
pub fn extract_by_weight(text: &str, start_weight: usize, max_weight: usize) -> &str {
    if max_weight == 0 {
        return "";
    }
    let Some(start) = start_byte(text, start_weight) else {
        return "";
    };
    let tail = &text[start..];
    let mut acc = 0usize;
    let mut end = 0usize;
    for (byte, c, w) in weighted(tail) {
        acc += w;
        if acc > max_weight {
            break;
        }
        end = byte + c.len_utf8();
    }
    &tail[..end]
}
