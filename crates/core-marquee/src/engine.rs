//! Marquee engine: the single entry point used by drivers.
//!
//! Owns the adaptive timer and the current scroll session. Callers push lyric
//! updates as they arrive and call [`MarqueeEngine::tick`] on a cadence of
//! [`MarqueeEngine::current_delay_ms`]; the engine never reads a clock and
//! never blocks. Calls must be serialized by the owner.

use std::sync::Arc;

use core_text::{ShiftPlanner, normalize_lyric};
use core_timing::{AdaptiveTimer, SampleOutcome, TimerConfig};
use tracing::{debug, trace};

use crate::machine::{MarqueeLayout, ScrollStateMachine};
use crate::session::{ScrollPhase, ScrollSession};

/// Effect of a lyric update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricChange {
    /// False when the update repeated the current line.
    pub changed: bool,
    /// Timer decision for a changed line.
    pub sample: Option<SampleOutcome>,
    /// Step interval to re-arm the tick with.
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MarqueeEngine {
    machine: ScrollStateMachine,
    timer: AdaptiveTimer,
    session: Option<ScrollSession>,
    display: String,
}

impl MarqueeEngine {
    pub fn new(layout: MarqueeLayout, timer: TimerConfig) -> Self {
        Self::with_planner(layout, ShiftPlanner::default(), timer)
    }

    pub fn with_planner(layout: MarqueeLayout, planner: ShiftPlanner, timer: TimerConfig) -> Self {
        Self {
            machine: ScrollStateMachine::new(layout, planner),
            timer: AdaptiveTimer::new(timer),
            session: None,
            display: String::new(),
        }
    }

    /// Feed a lyric line observed at `now_ms`.
    ///
    /// The line is NFC-normalized first. A line equal to the current one is a
    /// no-op; a different line records a timing sample and starts a new
    /// scroll session.
    pub fn on_lyric_update(&mut self, text: &str, now_ms: u64) -> LyricChange {
        let text = normalize_lyric(text);
        if self.session.as_ref().is_some_and(|s| s.text() == text) {
            return LyricChange {
                changed: false,
                sample: None,
                delay_ms: self.timer.current_delay_ms(),
            };
        }

        let sample = self.timer.on_lyric_changed(&text, now_ms);
        let session = ScrollSession::start(text, now_ms);
        debug!(
            target: "marquee.engine",
            weight = session.weight(),
            chars = session.text().chars().count(),
            ?sample,
            delay_ms = self.timer.current_delay_ms(),
            "lyric_session_start"
        );
        self.session = Some(session);
        LyricChange {
            changed: true,
            sample: Some(sample),
            delay_ms: self.timer.current_delay_ms(),
        }
    }

    /// Text to display at `now_ms`. Empty until a lyric has been seen.
    pub fn tick(&mut self, now_ms: u64) -> String {
        let Some(session) = self.session.take() else {
            return String::new();
        };
        let before = session.phase();
        let lyric: Arc<str> = session.shared_text();
        let step = self.machine.tick(session, &lyric, now_ms);
        let after = step.session.phase();
        if before != after {
            debug!(target: "marquee.engine", from = ?before, to = ?after, now_ms, "scroll_phase");
        }
        trace!(
            target: "marquee.engine",
            phase = ?after,
            offset = step.session.offset(),
            display_weight = core_text::total_weight(&step.display),
            "marquee_tick"
        );
        self.session = Some(step.session);
        self.display.clone_from(&step.display);
        step.display
    }

    /// Interval until the next tick should fire.
    pub fn current_delay_ms(&self) -> u64 {
        self.timer.current_delay_ms()
    }

    /// Last text returned by [`tick`](Self::tick).
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn lyric(&self) -> Option<&str> {
        self.session.as_ref().map(ScrollSession::text)
    }

    pub fn session(&self) -> Option<&ScrollSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Option<ScrollPhase> {
        self.session.as_ref().map(ScrollSession::phase)
    }

    pub fn offset(&self) -> usize {
        self.session.as_ref().map_or(0, ScrollSession::offset)
    }

    pub fn timer(&self) -> &AdaptiveTimer {
        &self.timer
    }

    pub fn layout(&self) -> &MarqueeLayout {
        self.machine.layout()
    }

    /// Drop the current line but keep timing history.
    pub fn stop(&mut self) {
        self.session = None;
        self.display.clear();
    }

    /// Drop the current line and all timing history (new song).
    pub fn reset(&mut self) {
        self.stop();
        self.timer.reset();
    }
}
