//! Scroll state machine.
//!
//! Per tick, for a line heavier than the display budget:
//!
//! | phase          | shows                                   | leaves when                                  |
//! |----------------|-----------------------------------------|----------------------------------------------|
//! | `InitialPause` | `window(0, budget)`                     | `initial_pause_ms` elapsed -> `Scrolling`     |
//! | `Scrolling`    | `window(offset, budget)`, then advances | remaining `<= budget` -> `FinalPause`         |
//! | `FinalPause`   | `window(offset, max(remaining, budget))`| `final_pause_ms` elapsed -> `Done`            |
//! | `Done`         | same as `FinalPause`                    | never (line change starts a new session)     |
//!
//! When the remaining weight drops to the compensation threshold or below,
//! the whole remainder is shown at once instead of scrolling into a nearly
//! empty final frame. The tail may then exceed the display budget.
//!
//! Lines that fit the budget are shown whole on every tick and never use the
//! phase machinery.

use core_text::{ShiftPlanner, extract_by_weight};

use crate::session::{ScrollPhase, ScrollSession};

/// Capsule geometry and pause lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarqueeLayout {
    /// Visual capacity of the chip (about 11 CJK or 22 Latin glyphs).
    pub max_display_weight: usize,
    /// Remainders at or below this are shown in one go.
    pub compensation_threshold: usize,
    pub initial_pause_ms: u64,
    pub final_pause_ms: u64,
}

impl Default for MarqueeLayout {
    fn default() -> Self {
        Self {
            max_display_weight: 22,
            compensation_threshold: 8,
            initial_pause_ms: 1000,
            final_pause_ms: 500,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub session: ScrollSession,
    pub display: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollStateMachine {
    layout: MarqueeLayout,
    planner: ShiftPlanner,
}

impl ScrollStateMachine {
    pub fn new(layout: MarqueeLayout, planner: ShiftPlanner) -> Self {
        Self { layout, planner }
    }

    pub fn layout(&self) -> &MarqueeLayout {
        &self.layout
    }

    /// Advance `session` for the current `lyric` at `now_ms`.
    ///
    /// A lyric that differs (by value) from the session's line starts a new
    /// session at `now_ms` before the tick is evaluated.
    pub fn tick(&self, session: ScrollSession, lyric: &str, now_ms: u64) -> Step {
        let session = if session.text() == lyric {
            session
        } else {
            ScrollSession::start(lyric, now_ms)
        };
        self.advance(session, now_ms)
    }

    fn advance(&self, session: ScrollSession, now_ms: u64) -> Step {
        let budget = self.layout.max_display_weight;
        if session.weight() <= budget {
            let display = session.text().to_owned();
            return Step { session, display };
        }

        match session.phase() {
            ScrollPhase::InitialPause => {
                let display = extract_by_weight(session.text(), 0, budget).to_owned();
                let session = if session.elapsed(now_ms) >= self.layout.initial_pause_ms {
                    session.entering(ScrollPhase::Scrolling)
                } else {
                    session
                };
                Step { session, display }
            }
            ScrollPhase::Scrolling => {
                let remaining = session.remaining();
                let offset = session.offset();
                if remaining <= self.layout.compensation_threshold {
                    let display = extract_by_weight(session.text(), offset, remaining).to_owned();
                    let session = session.with_phase(ScrollPhase::FinalPause, now_ms);
                    Step { session, display }
                } else if remaining <= budget {
                    let display = extract_by_weight(session.text(), offset, budget).to_owned();
                    let session = session.with_phase(ScrollPhase::FinalPause, now_ms);
                    Step { session, display }
                } else {
                    let display = extract_by_weight(session.text(), offset, budget).to_owned();
                    let step = self.planner.next_shift(session.text(), offset);
                    Step {
                        session: session.advanced_by(step),
                        display,
                    }
                }
            }
            ScrollPhase::FinalPause => {
                let display = self.tail(&session);
                let session = if session.elapsed(now_ms) >= self.layout.final_pause_ms {
                    session.entering(ScrollPhase::Done)
                } else {
                    session
                };
                Step { session, display }
            }
            ScrollPhase::Done => {
                let display = self.tail(&session);
                Step { session, display }
            }
        }
    }

    fn tail(&self, session: &ScrollSession) -> String {
        let budget = session.remaining().max(self.layout.max_display_weight);
        extract_by_weight(session.text(), session.offset(), budget).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CJK_23: &str = "一二三四五六七八九十一二三四五六七八九十一二三";

    fn machine() -> ScrollStateMachine {
        ScrollStateMachine::default()
    }

    #[test]
    fn short_line_is_shown_whole() {
        let m = machine();
        let mut s = ScrollSession::start("Hello World", 0);
        for t in [0, 1000, 2000, 5000] {
            let step = m.tick(s, "Hello World", t);
            assert_eq!(step.display, "Hello World");
            assert_eq!(step.session.phase(), ScrollPhase::InitialPause);
            s = step.session;
        }
    }

    #[test]
    fn initial_pause_holds_then_enters_scrolling() {
        let m = machine();
        let s = ScrollSession::start(CJK_23, 0);
        let step = m.tick(s, CJK_23, 0);
        assert_eq!(step.display, "一二三四五六七八九十一");
        assert_eq!(step.session.phase(), ScrollPhase::InitialPause);

        let step = m.tick(step.session, CJK_23, 999);
        assert_eq!(step.session.phase(), ScrollPhase::InitialPause);

        let step = m.tick(step.session, CJK_23, 1000);
        assert_eq!(step.session.phase(), ScrollPhase::Scrolling);
        assert_eq!(step.session.offset(), 0);
        assert_eq!(step.display, "一二三四五六七八九十一");
    }

    #[test]
    fn scrolling_advances_two_glyphs_until_last_segment() {
        let m = machine();
        let mut s = ScrollSession::start(CJK_23, 0).entering(ScrollPhase::Scrolling);
        let mut offsets = Vec::new();
        let mut now = 1000;
        while s.phase() == ScrollPhase::Scrolling {
            let step = m.tick(s, CJK_23, now);
            s = step.session;
            offsets.push(s.offset());
            now += 1800;
        }
        assert_eq!(offsets, vec![4, 8, 12, 16, 20, 24, 24]);
        assert_eq!(s.phase(), ScrollPhase::FinalPause);
    }

    #[test]
    fn compensation_shows_whole_remainder() {
        // 20 Latin + 6 more: after one shift of 3 from offset 15 the remainder is small.
        let line = "abcdefghijklmnopqrstuvwxyz"; // weight 26
        let m = machine();
        let s = ScrollSession::start(line, 0)
            .entering(ScrollPhase::Scrolling)
            .advanced_by(18); // remaining 8
        let step = m.tick(s, line, 5000);
        assert_eq!(step.display, "stuvwxyz");
        assert_eq!(step.session.phase(), ScrollPhase::FinalPause);
        assert_eq!(step.session.phase_started_ms(), 5000);
    }

    #[test]
    fn final_pause_settles_into_done() {
        let line = "abcdefghijklmnopqrstuvwxyz";
        let m = machine();
        let s = ScrollSession::start(line, 0)
            .entering(ScrollPhase::Scrolling)
            .advanced_by(4)
            .with_phase(ScrollPhase::FinalPause, 3000);
        let step = m.tick(s, line, 3499);
        assert_eq!(step.session.phase(), ScrollPhase::FinalPause);
        assert_eq!(step.display, "efghijklmnopqrstuvwxyz");
        let step = m.tick(step.session, line, 3500);
        assert_eq!(step.session.phase(), ScrollPhase::Done);
        let step = m.tick(step.session, line, 10_000);
        assert_eq!(step.session.phase(), ScrollPhase::Done);
        assert_eq!(step.display, "efghijklmnopqrstuvwxyz");
    }

    #[test]
    fn changed_lyric_restarts_session() {
        let m = machine();
        let s = ScrollSession::start(CJK_23, 0)
            .entering(ScrollPhase::Scrolling)
            .advanced_by(12);
        let other = "abcdefghijklmnopqrstuvwxyz0123";
        let step = m.tick(s, other, 7000);
        assert_eq!(step.session.text(), other);
        assert_eq!(step.session.offset(), 0);
        assert_eq!(step.session.phase(), ScrollPhase::InitialPause);
        assert_eq!(step.session.phase_started_ms(), 7000);
        assert_eq!(step.display, "abcdefghijklmnopqrstuv");
    }
}
