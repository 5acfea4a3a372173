//! Sink failures are reported through tracing, not propagated.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, bail};
use core_display::{CapsuleFrame, CapsulePublisher, DisplaySink, PublishOutcome};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

struct BrokenSink;

impl DisplaySink for BrokenSink {
    fn publish(&mut self, _frame: &CapsuleFrame) -> Result<()> {
        bail!("notification channel closed")
    }
}

#[test]
fn sink_failure_is_logged_under_display_target() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = BufferWriter {
        inner: buffer.clone(),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(writer)
        .finish();

    let mut publisher = CapsulePublisher::new(BrokenSink);
    let outcome = with_default(subscriber, || {
        publisher.offer(&CapsuleFrame::new("Music", "la la", "la la la", None), 0)
    });

    assert_eq!(outcome, PublishOutcome::Failed);
    let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(log_output.contains("WARN display.publish:"), "{log_output}");
    assert!(log_output.contains("sink_publish_failed"));
    assert!(log_output.contains("notification channel closed"));
    // Lyric text never reaches the log.
    assert!(!log_output.contains("la la"));
}
