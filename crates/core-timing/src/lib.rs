//! Adaptive scroll pacing.
//!
//! The marquee has no timing data from the music app beyond the moments at
//! which lyric lines change. `AdaptiveTimer` observes those moments, keeps a
//! short sliding window of how long each line stayed on screen, and derives
//! the interval between scroll steps so a long line finishes scrolling at
//! about the time the next one arrives.
//!
//! Sample acceptance (per lyric change):
//! - First observed line only records a baseline.
//! - `elapsed / previous_chars < min_char_duration_ms` is noise and is ignored
//!   outright; the baseline is *not* moved.
//! - `elapsed > max_gap_ms` is a pause (seek, buffering): the baseline moves
//!   to the new line but the sample is not recorded.
//! - Anything else is recorded and the delay recomputed.
//!
//! Delay model, with `W` the weight of the line whose dwell was measured and
//! `T` the mean recorded dwell:
//!
//! ```text
//! steps     = max(1, W / shift_weight)
//! available = T - static_reserve - steps * base_focus
//! per_unit  = available / W   (fallback_unit when available <= 0)
//! delay     = clamp(base_focus + per_unit * shift_weight, min_delay, max_delay)
//! ```
//!
//! Timestamps are supplied by the caller; nothing here reads a clock.

use std::collections::VecDeque;

use core_text::total_weight;
use tracing::debug;

/// Tunables for [`AdaptiveTimer`]. `Default` matches the shipped behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Step interval used before any sample is accepted.
    pub default_delay_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Lines that changed faster than this per character are treated as noise.
    pub min_char_duration_ms: u64,
    /// Dwell longer than this is treated as a pause rather than a sample.
    pub max_gap_ms: u64,
    /// Sliding window length.
    pub history: usize,
    /// Time reserved for the initial and final pauses.
    pub static_reserve_ms: u64,
    /// Per-step eye refocus time.
    pub base_focus_ms: u64,
    /// Assumed weight advanced per scroll step.
    pub shift_weight: u64,
    /// Per-weight-unit time used when the reserve eats the whole dwell.
    pub fallback_unit_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 1800,
            min_delay_ms: 500,
            max_delay_ms: 5000,
            min_char_duration_ms: 50,
            max_gap_ms: 30_000,
            history: 5,
            static_reserve_ms: 1500,
            base_focus_ms: 500,
            shift_weight: 5,
            fallback_unit_ms: 100,
        }
    }
}

impl TimerConfig {
    fn clamp_delay(&self, delay: u64) -> u64 {
        delay.max(self.min_delay_ms).min(self.max_delay_ms)
    }
}

/// One accepted dwell measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    /// Time the measured line stayed current.
    pub elapsed_ms: u64,
    /// Code point count of the measured line. An astral glyph such as a CJK
    /// Extension B ideograph counts once, not as two UTF-16 units.
    pub chars: usize,
}

/// What a lyric change did to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// First line seen; baseline recorded.
    Baseline,
    /// Update arrived too quickly to be a real line change; ignored.
    TooFast { per_char_ms: u64 },
    /// Previous line dwelled past the gap limit; baseline restarted.
    Pause { elapsed_ms: u64 },
    /// Sample recorded and delay recomputed.
    Accepted { delay_ms: u64 },
}

#[derive(Debug, Clone, Copy)]
struct LineMark {
    at_ms: u64,
    chars: usize,
    weight: usize,
}

#[derive(Debug, Clone)]
pub struct AdaptiveTimer {
    config: TimerConfig,
    last: Option<LineMark>,
    samples: VecDeque<TimingSample>,
    delay_ms: u64,
}

impl Default for AdaptiveTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl AdaptiveTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            last: None,
            samples: VecDeque::with_capacity(config.history + 1),
            delay_ms: config.clamp_delay(config.default_delay_ms),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Current step interval, always within `[min_delay_ms, max_delay_ms]`.
    pub fn current_delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Accepted samples, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &TimingSample> {
        self.samples.iter()
    }

    pub fn history_len(&self) -> usize {
        self.samples.len()
    }

    /// Forget all measurements (new song).
    pub fn reset(&mut self) {
        self.last = None;
        self.samples.clear();
        self.delay_ms = self.config.clamp_delay(self.config.default_delay_ms);
    }

    /// Record that `text` became the current line at `now_ms`.
    pub fn on_lyric_changed(&mut self, text: &str, now_ms: u64) -> SampleOutcome {
        let mark = LineMark {
            at_ms: now_ms,
            chars: text.chars().count(),
            weight: total_weight(text),
        };
        let Some(prev) = self.last else {
            self.last = Some(mark);
            return SampleOutcome::Baseline;
        };

        let elapsed_ms = now_ms.saturating_sub(prev.at_ms);
        let per_char_ms = if prev.chars > 0 {
            elapsed_ms / prev.chars as u64
        } else {
            0
        };

        if per_char_ms < self.config.min_char_duration_ms {
            debug!(target: "marquee.timer", per_char_ms, elapsed_ms, "sample_too_fast");
            return SampleOutcome::TooFast { per_char_ms };
        }

        if elapsed_ms > self.config.max_gap_ms {
            debug!(target: "marquee.timer", elapsed_ms, "sample_pause");
            self.last = Some(mark);
            return SampleOutcome::Pause { elapsed_ms };
        }

        self.samples.push_back(TimingSample {
            elapsed_ms,
            chars: prev.chars,
        });
        while self.samples.len() > self.config.history {
            self.samples.pop_front();
        }
        self.last = Some(mark);
        self.delay_ms = self.recompute(prev.weight);
        debug!(
            target: "marquee.timer",
            delay_ms = self.delay_ms,
            weight = prev.weight,
            samples = self.samples.len(),
            "adaptive_delay"
        );
        SampleOutcome::Accepted {
            delay_ms: self.delay_ms,
        }
    }

    fn recompute(&self, weight: usize) -> u64 {
        let cfg = &self.config;
        if self.samples.is_empty() {
            return cfg.clamp_delay(cfg.default_delay_ms);
        }
        let total: u64 = self.samples.iter().map(|s| s.elapsed_ms).sum();
        let avg = total / self.samples.len() as u64;
        if weight == 0 || avg < cfg.static_reserve_ms {
            return cfg.clamp_delay(cfg.default_delay_ms);
        }

        let weight = weight as i64;
        let steps = (weight / cfg.shift_weight.max(1) as i64).max(1);
        let available =
            avg as i64 - cfg.static_reserve_ms as i64 - steps * cfg.base_focus_ms as i64;
        let per_unit = if available > 0 {
            (available / weight) as u64
        } else {
            cfg.fallback_unit_ms
        };
        let delay = cfg
            .base_focus_ms
            .saturating_add(per_unit.saturating_mul(cfg.shift_weight));
        cfg.clamp_delay(delay)
    }
}
