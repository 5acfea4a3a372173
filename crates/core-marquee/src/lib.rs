//! Adaptive lyric marquee.
//!
//! Composition (leaf to root):
//! - `core_text` measures weight, cuts windows and plans shifts.
//! - `core_timing` paces steps from observed line dwell times.
//! - [`session`] holds one line's scroll state as a value.
//! - [`machine`] is the pure `(session, now) -> (session', display)` step.
//! - [`engine`] wires lyric updates and ticks together for a driver.

pub mod engine;
pub mod machine;
pub mod session;

pub use engine::{LyricChange, MarqueeEngine};
pub use machine::{MarqueeLayout, ScrollStateMachine, Step};
pub use session::{ScrollPhase, ScrollSession};
