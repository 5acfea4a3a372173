//! Deterministic replay of a timed script on a virtual clock.

use core_display::{CapsuleFrame, RecordingSink};
use core_events::{Event, TimedEvent};
use tracing::debug;

use crate::runtime::CapsuleRuntime;

/// A frame that reached the sink, stamped with the virtual time it was published at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFrame {
    pub at_ms: u64,
    pub frame: CapsuleFrame,
}

/// Replay `script` through `runtime`, interleaving events with tick deadlines.
///
/// An event and a tick due at the same instant are applied event first. Once
/// the script is exhausted ticking continues until the marquee settles, the
/// runtime stops ticking, or a `stop` event is seen. The virtual clock moves
/// forward by at least one millisecond per tick.
pub fn simulate(
    script: &[TimedEvent],
    runtime: &mut CapsuleRuntime<RecordingSink>,
) -> Vec<PublishedFrame> {
    let mut out = Vec::new();
    let mut events = script.iter().peekable();
    let mut deadline: Option<u64> = None;
    let mut ticks = 0usize;

    loop {
        let next_event_ms = events.peek().map(|e| e.at_ms);
        let now = match (next_event_ms, deadline) {
            (None, None) => break,
            (None, Some(_)) if runtime.is_settled() => break,
            (Some(at), Some(due)) if due < at => {
                ticks += 1;
                deadline = Some(runtime.tick(due).max(due + 1));
                due
            }
            (None, Some(due)) => {
                ticks += 1;
                deadline = Some(runtime.tick(due).max(due + 1));
                due
            }
            (Some(_), _) => {
                let Some(timed) = events.next() else { break };
                let stop = matches!(timed.event, Event::Shutdown);
                if let Some(next) = runtime.handle(timed.event.clone(), timed.at_ms) {
                    deadline = Some(next.max(timed.at_ms + 1));
                }
                if !runtime.is_ticking() {
                    deadline = None;
                }
                collect(runtime, timed.at_ms, &mut out);
                if stop {
                    break;
                }
                continue;
            }
        };
        collect(runtime, now, &mut out);
    }

    debug!(
        target: "runtime.simulate",
        events = script.len(),
        ticks,
        frames = out.len(),
        "simulation_complete"
    );
    out
}

fn collect(runtime: &mut CapsuleRuntime<RecordingSink>, at_ms: u64, out: &mut Vec<PublishedFrame>) {
    out.extend(
        runtime
            .publisher_mut()
            .sink_mut()
            .take()
            .into_iter()
            .map(|frame| PublishedFrame { at_ms, frame }),
    );
}
