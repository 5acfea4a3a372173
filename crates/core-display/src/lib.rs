//! Capsule output: frame model, sinks and the publishing policy.

pub mod frame;
pub mod publisher;
pub mod sink;

pub use frame::{CapsuleFrame, progress_percent};
pub use publisher::{CapsulePublisher, PublishMetricsSnapshot, PublishOutcome};
pub use sink::{DisplaySink, RecordingSink, WriterSink};
