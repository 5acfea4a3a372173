//! Built-in event sources: timed script replay and line-by-line stdin.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::script::{TimedEvent, parse_line, parse_script};
use crate::{AsyncEventSource, CHANNEL_SEND_FAILURES, Event, SCRIPT_LINES_REJECTED};

/// Replays a parsed script in real time, relative to the moment it is spawned.
pub struct ScriptEventSource {
    events: Vec<TimedEvent>,
}

impl ScriptEventSource {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        Self { events }
    }

    pub fn from_path(path: &Path) -> crate::EventResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let events =
            parse_script(&content).with_context(|| format!("parsing script {}", path.display()))?;
        Ok(Self::new(events))
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }
}

impl AsyncEventSource for ScriptEventSource {
    fn name(&self) -> &'static str {
        "script"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let events = self.events;
        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for timed in events {
                tokio::time::sleep_until(start + Duration::from_millis(timed.at_ms)).await;
                debug!(target: "runtime.events", kind = timed.event.kind(), at_ms = timed.at_ms, "script_event");
                if tx.send(timed.event).await.is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        })
    }
}

/// Reads script lines as they arrive and emits each event immediately; the
/// timestamp column is parsed but not waited on. Malformed lines are logged
/// and skipped.
pub struct StdinEventSource<R = BufReader<Stdin>> {
    reader: R,
}

impl StdinEventSource {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for StdinEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinEventSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> AsyncEventSource for StdinEventSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let mut lines = self.reader.lines();
        tokio::spawn(async move {
            let mut line_no = 0usize;
            loop {
                let raw = match lines.next_line().await {
                    Ok(Some(raw)) => raw,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(target: "runtime.events", error = %err, "stdin_read_failed");
                        break;
                    }
                };
                line_no += 1;
                let event = match parse_line(line_no, &raw) {
                    Ok(Some(timed)) => timed.event,
                    Ok(None) => continue,
                    Err(err) => {
                        SCRIPT_LINES_REJECTED.fetch_add(1, Ordering::Relaxed);
                        warn!(target: "runtime.events", error = %err, "script_line_rejected");
                        continue;
                    }
                };
                if tx.send(event).await.is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::sync::mpsc;

    async fn drain(mut rx: mpsc::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(Some(ev)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn script_source_replays_in_order() {
        let events = parse_script("0 play\n10 lyric |one\n20 lyric |two\n30 stop").unwrap();
        let (tx, rx) = mpsc::channel(8);
        let started = tokio::time::Instant::now();
        let handle = Box::new(ScriptEventSource::new(events)).spawn(tx);
        let got = drain(rx).await;
        handle.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        let kinds: Vec<_> = got.iter().map(Event::kind).collect();
        assert_eq!(kinds, ["play", "lyric", "lyric", "stop"]);
    }

    #[tokio::test]
    async fn script_source_loads_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "# demo\n0 lyric com.miui.player|hello").unwrap();
        let src = ScriptEventSource::from_path(tmp.path()).unwrap();
        assert_eq!(src.events().len(), 1);
    }

    #[test]
    fn script_source_reports_parse_errors() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "0 play\nsoon pause").unwrap();
        let err = ScriptEventSource::from_path(tmp.path())
            .err()
            .expect("malformed script must fail");
        let chain = format!("{err:#}");
        assert!(chain.contains("line 2"), "{chain}");
    }

    #[tokio::test]
    async fn stdin_source_skips_bad_lines() {
        let input: &'static [u8] = b"0 lyric |first\nnot a line\n\n99999 lyric |second\n";
        let (tx, rx) = mpsc::channel(8);
        let handle = Box::new(StdinEventSource::from_reader(input)).spawn(tx);
        let got = drain(rx).await;
        handle.await.unwrap();
        assert_eq!(
            got,
            vec![
                Event::Lyric {
                    text: "first".into(),
                    source_app: None
                },
                Event::Lyric {
                    text: "second".into(),
                    source_app: None
                },
            ]
        );
    }

    #[tokio::test]
    async fn sources_stop_when_receiver_is_gone() {
        let events = parse_script("0 play\n0 pause\n0 play").unwrap();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = Box::new(ScriptEventSource::new(events)).spawn(tx);
        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("source must exit")
            .unwrap();
    }
}
