//! De-duplicating, throttled frame publisher.
//!
//! Offers arrive on every marquee tick, on every progress update and on every
//! lyric change. A frame reaches the sink only when:
//! - at least `throttle_ms` passed since the last offer that got through the
//!   gate, and
//! - its `(short_text, progress)` pair differs from the last published one.
//!
//! `force()` opens both gates for the next offer; drivers call it when a new
//! lyric line must show immediately.

use tracing::{trace, warn};

use crate::frame::CapsuleFrame;
use crate::sink::DisplaySink;

/// Outcome of [`CapsulePublisher::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Same visible content as the last published frame.
    Unchanged,
    /// Inside the throttle window.
    Throttled,
    /// The sink reported an error; the next offer retries.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishMetricsSnapshot {
    pub published: u64,
    pub unchanged: u64,
    pub throttled: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub struct CapsulePublisher<S: DisplaySink> {
    sink: S,
    throttle_ms: u64,
    last_gate_ms: Option<u64>,
    last_visible: Option<(String, Option<u8>)>,
    metrics: PublishMetricsSnapshot,
}

impl<S: DisplaySink> CapsulePublisher<S> {
    pub const DEFAULT_THROTTLE_MS: u64 = 50;

    pub fn new(sink: S) -> Self {
        Self::with_throttle(sink, Self::DEFAULT_THROTTLE_MS)
    }

    pub fn with_throttle(sink: S, throttle_ms: u64) -> Self {
        Self {
            sink,
            throttle_ms,
            last_gate_ms: None,
            last_visible: None,
            metrics: PublishMetricsSnapshot::default(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn metrics_snapshot(&self) -> PublishMetricsSnapshot {
        self.metrics
    }

    /// Forget the throttle timestamp and the last published content.
    pub fn force(&mut self) {
        self.last_gate_ms = None;
        self.last_visible = None;
    }

    pub fn offer(&mut self, frame: &CapsuleFrame, now_ms: u64) -> PublishOutcome {
        if let Some(last) = self.last_gate_ms {
            if now_ms.saturating_sub(last) < self.throttle_ms {
                self.metrics.throttled += 1;
                return PublishOutcome::Throttled;
            }
        }
        self.last_gate_ms = Some(now_ms);

        let visible = (frame.short_text.clone(), frame.progress);
        if self.last_visible.as_ref() == Some(&visible) {
            self.metrics.unchanged += 1;
            return PublishOutcome::Unchanged;
        }

        match self.sink.publish(frame) {
            Ok(()) => {
                trace!(
                    target: "display.publish",
                    short_len = frame.short_text.chars().count(),
                    progress = ?frame.progress,
                    now_ms,
                    "frame_published"
                );
                self.last_visible = Some(visible);
                self.metrics.published += 1;
                PublishOutcome::Published
            }
            Err(err) => {
                warn!(target: "display.publish", error = %err, "sink_publish_failed");
                self.last_visible = None;
                self.metrics.failed += 1;
                PublishOutcome::Failed
            }
        }
    }
}
