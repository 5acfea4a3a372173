//! Per-line scroll session.
//!
//! A session is created the moment a new (different) lyric line is observed
//! and is replaced wholesale by the next one. It is a plain value: the state
//! machine takes a session and returns the next one, so the whole marquee can
//! be replayed deterministically from a list of timestamps.

use std::sync::Arc;

use core_text::total_weight;

/// Lifecycle of one line. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScrollPhase {
    /// Holding the beginning of the line so it can be read.
    InitialPause,
    /// Advancing the window each tick.
    Scrolling,
    /// Holding the tail of the line.
    FinalPause,
    /// Terminal until the line changes.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSession {
    text: Arc<str>,
    weight: usize,
    offset: usize,
    phase: ScrollPhase,
    phase_started_ms: u64,
}

impl ScrollSession {
    /// Fresh session for `text` starting at `now_ms`.
    pub fn start(text: impl Into<Arc<str>>, now_ms: u64) -> Self {
        let text = text.into();
        let weight = total_weight(&text);
        Self {
            text,
            weight,
            offset: 0,
            phase: ScrollPhase::InitialPause,
            phase_started_ms: now_ms,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Cached total weight of the line.
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Weight-space cursor; never exceeds [`weight`](Self::weight).
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// Timestamp at which the current pause phase began.
    pub fn phase_started_ms(&self) -> u64 {
        self.phase_started_ms
    }

    /// Weight not yet scrolled past.
    pub fn remaining(&self) -> usize {
        self.weight.saturating_sub(self.offset)
    }

    pub(crate) fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.phase_started_ms)
    }

    pub(crate) fn with_phase(mut self, phase: ScrollPhase, now_ms: u64) -> Self {
        debug_assert!(phase >= self.phase, "scroll phase moved backwards");
        self.phase = phase;
        self.phase_started_ms = now_ms;
        self
    }

    /// Phase change that keeps the running timer (Initial -> Scrolling).
    pub(crate) fn entering(mut self, phase: ScrollPhase) -> Self {
        debug_assert!(phase >= self.phase, "scroll phase moved backwards");
        self.phase = phase;
        self
    }

    pub(crate) fn advanced_by(mut self, step: usize) -> Self {
        self.offset = (self.offset + step).min(self.weight);
        self
    }
}
