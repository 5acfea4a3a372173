//! Event types, async event sources and the timed script format for capsulyric.

use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod script;
pub mod sources;

pub use script::{ScriptError, TimedEvent, parse_line, parse_script};
pub use sources::{ScriptEventSource, StdinEventSource};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers await `send`, so a slow consumer
// parks them instead of dropping lyric or playback updates. A closed channel means the runtime is
// gone and every source must stop.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static SCRIPT_LINES_REJECTED: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A lyric line pushed by a lyric provider. `source_app` is the player package, if known.
    Lyric {
        text: String,
        source_app: Option<String>,
    },
    /// Raw media metadata as published by a player. Car-protocol players put the current lyric
    /// line in the title and "artist - title" in the artist field.
    Metadata {
        package: String,
        raw_title: Option<String>,
        raw_artist: Option<String>,
        duration_ms: Option<i64>,
    },
    Progress {
        position_ms: i64,
        duration_ms: i64,
    },
    Playback {
        playing: bool,
    },
    Shutdown,
}

impl Event {
    /// Stable short name for logging; never includes lyric text.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Lyric { .. } => "lyric",
            Event::Metadata { .. } => "meta",
            Event::Progress { .. } => "progress",
            Event::Playback { playing: true } => "play",
            Event::Playback { playing: false } => "pause",
            Event::Shutdown => "stop",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when `tx.send(..).await`
    /// returns Err (channel closed) or when their input is exhausted.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// clone of `tx`; the caller should drop its final `Sender` so the channel closes once every
    /// source has finished.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        // Drain so a second call spawns nothing.
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Helper result type for event plumbing.
pub type EventResult<T> = anyhow::Result<T>;
