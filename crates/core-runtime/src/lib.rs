//! Capsule runtime: routes lyric, metadata and playback events through the
//! marquee engine to a display sink.

pub mod runtime;
pub mod settings;
pub mod simulate;

pub use runtime::CapsuleRuntime;
pub use settings::RuntimeSettings;
pub use simulate::{PublishedFrame, simulate};
