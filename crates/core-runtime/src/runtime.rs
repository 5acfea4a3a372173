//! Single-owner capsule runtime.
//!
//! `CapsuleRuntime` is the glue between incoming events and the capsule
//! sink. It never reads a clock: every entry point takes the caller's `now`
//! and returns the next tick deadline when the tick must be (re-)armed, so
//! the same code drives both the tokio loop and the virtual-clock
//! simulation.

use core_display::{CapsuleFrame, CapsulePublisher, DisplaySink, PublishOutcome, progress_percent};
use core_events::Event;
use core_marquee::{MarqueeEngine, ScrollPhase};
use core_rules::{RuleSet, TrackInfo, Whitelist, app_display_name, extract_track};
use tracing::{debug, trace};

use crate::settings::RuntimeSettings;

pub struct CapsuleRuntime<S: DisplaySink> {
    engine: MarqueeEngine,
    rules: RuleSet,
    whitelist: Whitelist,
    publisher: CapsulePublisher<S>,
    source_app: Option<String>,
    track: Option<TrackInfo>,
    progress: Option<u8>,
    playing: bool,
    ticking: bool,
}

impl<S: DisplaySink> CapsuleRuntime<S> {
    pub fn new(settings: RuntimeSettings, sink: S) -> Self {
        Self::from_parts(
            MarqueeEngine::new(settings.layout, settings.timer),
            settings.rules,
            settings.whitelist,
            CapsulePublisher::with_throttle(sink, settings.throttle_ms),
        )
    }

    pub fn from_parts(
        engine: MarqueeEngine,
        rules: RuleSet,
        whitelist: Whitelist,
        publisher: CapsulePublisher<S>,
    ) -> Self {
        Self {
            engine,
            rules,
            whitelist,
            publisher,
            source_app: None,
            track: None,
            progress: None,
            playing: false,
            ticking: false,
        }
    }

    pub fn engine(&self) -> &MarqueeEngine {
        &self.engine
    }

    pub fn publisher(&self) -> &CapsulePublisher<S> {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut CapsulePublisher<S> {
        &mut self.publisher
    }

    pub fn into_publisher(self) -> CapsulePublisher<S> {
        self.publisher
    }

    /// Last track recovered from whitelisted metadata.
    pub fn track(&self) -> Option<&TrackInfo> {
        self.track.as_ref()
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the driver should keep a tick armed.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// True once further ticks cannot change the display: no lyric, a line
    /// that fits the budget, or a finished scroll.
    pub fn is_settled(&self) -> bool {
        let Some(session) = self.engine.session() else {
            return true;
        };
        session.phase() == ScrollPhase::Done
            || session.weight() <= self.engine.layout().max_display_weight
    }

    /// Apply one event observed at `now_ms`. Returns the next tick deadline
    /// when the tick must be re-armed.
    pub fn handle(&mut self, event: Event, now_ms: u64) -> Option<u64> {
        trace!(target: "runtime", kind = event.kind(), now_ms, "event");
        match event {
            Event::Lyric { text, source_app } => {
                if source_app.is_some() {
                    self.source_app = source_app;
                }
                self.lyric_update(&text, now_ms)
            }
            Event::Metadata {
                package,
                raw_title,
                raw_artist,
                duration_ms,
            } => {
                if !self.whitelist.is_allowed(&package) {
                    debug!(target: "runtime", package = package.as_str(), "metadata_not_whitelisted");
                    return None;
                }
                let track = extract_track(
                    raw_title.as_deref(),
                    raw_artist.as_deref(),
                    &package,
                    &self.rules,
                );
                if duration_ms.is_some_and(|d| d <= 0) {
                    self.progress = None;
                }
                let lyric = track.lyric.clone();
                self.source_app = Some(package);
                self.track = Some(track);
                lyric.and_then(|line| self.lyric_update(&line, now_ms))
            }
            Event::Progress {
                position_ms,
                duration_ms,
            } => {
                self.progress = progress_percent(position_ms, duration_ms);
                self.publish(now_ms);
                None
            }
            Event::Playback { playing: true } => {
                if !self.playing {
                    debug!(target: "runtime", now_ms, "playback_started");
                    self.engine.reset();
                    self.publisher.force();
                    self.playing = true;
                }
                None
            }
            Event::Playback { playing: false } => {
                debug!(target: "runtime", now_ms, "playback_paused");
                self.playing = false;
                self.ticking = false;
                None
            }
            Event::Shutdown => {
                debug!(target: "runtime", now_ms, "playback_stopped");
                self.engine.stop();
                self.playing = false;
                self.ticking = false;
                None
            }
        }
    }

    /// Advance the marquee, offer the frame and return the next deadline.
    /// The deadline is always strictly after `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> u64 {
        if self.engine.lyric().is_some() {
            self.engine.tick(now_ms);
            self.publish(now_ms);
        }
        now_ms + self.engine.current_delay_ms().max(1)
    }

    fn lyric_update(&mut self, text: &str, now_ms: u64) -> Option<u64> {
        let change = self.engine.on_lyric_update(text, now_ms);
        if !change.changed {
            return None;
        }
        self.playing = true;
        self.ticking = true;
        self.publisher.force();
        Some(self.tick(now_ms))
    }

    fn publish(&mut self, now_ms: u64) -> Option<PublishOutcome> {
        let body = self.engine.lyric()?;
        let frame = CapsuleFrame::new(
            app_display_name(self.source_app.as_deref()),
            self.engine.display(),
            body,
            self.progress,
        );
        Some(self.publisher.offer(&frame, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_display::RecordingSink;
    use core_timing::TimerConfig;
    use pretty_assertions::assert_eq;

    fn runtime() -> CapsuleRuntime<RecordingSink> {
        CapsuleRuntime::new(RuntimeSettings::default(), RecordingSink::new())
    }

    fn lyric(text: &str, app: Option<&str>) -> Event {
        Event::Lyric {
            text: text.to_string(),
            source_app: app.map(str::to_string),
        }
    }

    #[test]
    fn lyric_update_publishes_immediately_and_arms_tick() {
        let mut rt = runtime();
        let next = rt.handle(lyric("Hello World", Some("com.tencent.qqmusic")), 100);
        assert_eq!(next, Some(1900));
        assert!(rt.is_ticking());
        let frames = rt.publisher().sink().frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], CapsuleFrame::new("QQ Music", "Hello World", "Hello World", None));
    }

    #[test]
    fn repeated_lyric_does_not_rearm() {
        let mut rt = runtime();
        rt.handle(lyric("Hello", None), 0);
        assert_eq!(rt.handle(lyric("Hello", None), 500), None);
        assert_eq!(rt.publisher().sink().frames().len(), 1);
    }

    #[test]
    fn lyric_inside_throttle_window_still_shows() {
        let mut rt = runtime();
        rt.handle(lyric("one", None), 0);
        rt.handle(lyric("two", None), 10);
        let shown: Vec<_> = rt
            .publisher()
            .sink()
            .frames()
            .iter()
            .map(|f| f.short_text.as_str())
            .collect();
        assert_eq!(shown, ["one", "two"]);
    }

    #[test]
    fn progress_republishes_with_percent() {
        let mut rt = runtime();
        rt.handle(lyric("Hello", None), 0);
        rt.handle(
            Event::Progress {
                position_ms: 5_000,
                duration_ms: 10_000,
            },
            100,
        );
        let frames = rt.publisher().sink().frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].progress, Some(50));
        assert_eq!(frames[1].title, "Music");
    }

    #[test]
    fn progress_before_any_lyric_publishes_nothing() {
        let mut rt = runtime();
        rt.handle(
            Event::Progress {
                position_ms: 1,
                duration_ms: 10,
            },
            0,
        );
        assert!(rt.publisher().sink().frames().is_empty());
        assert_eq!(rt.progress(), Some(10));
    }

    #[test]
    fn non_whitelisted_metadata_is_ignored() {
        let mut rt = runtime();
        let next = rt.handle(
            Event::Metadata {
                package: "com.example.other".into(),
                raw_title: Some("line".into()),
                raw_artist: Some("A - B".into()),
                duration_ms: None,
            },
            0,
        );
        assert_eq!(next, None);
        assert!(rt.track().is_none());
        assert!(rt.engine().lyric().is_none());
    }

    #[test]
    fn car_protocol_metadata_feeds_the_marquee() {
        let mut rt = runtime();
        let next = rt.handle(
            Event::Metadata {
                package: "com.miui.player".into(),
                raw_title: Some("看不见的风".into()),
                raw_artist: Some("Singer - Song".into()),
                duration_ms: Some(200_000),
            },
            0,
        );
        assert_eq!(next, Some(1800));
        let track = rt.track().unwrap();
        assert_eq!(track.title, "Song");
        assert_eq!(track.artist, "Singer");
        assert_eq!(rt.engine().lyric(), Some("看不见的风"));
        assert_eq!(rt.publisher().sink().frames()[0].title, "Mi Music");
    }

    #[test]
    fn pause_halts_and_play_resets() {
        let mut rt = runtime();
        rt.handle(lyric("Hello", None), 0);
        rt.handle(Event::Playback { playing: false }, 1000);
        assert!(!rt.is_ticking());
        assert!(!rt.is_playing());
        assert_eq!(rt.engine().lyric(), Some("Hello"));

        rt.handle(Event::Playback { playing: true }, 2000);
        assert!(rt.is_playing());
        assert!(!rt.is_ticking());
        assert_eq!(rt.engine().lyric(), None);
        assert_eq!(rt.engine().timer().history_len(), 0);
    }

    #[test]
    fn tick_deadline_moves_forward_with_zero_delay() {
        let settings = RuntimeSettings {
            timer: TimerConfig {
                default_delay_ms: 0,
                min_delay_ms: 0,
                ..TimerConfig::default()
            },
            ..RuntimeSettings::default()
        };
        let mut rt = CapsuleRuntime::new(settings, RecordingSink::new());
        assert_eq!(rt.handle(lyric("Hello", None), 40), Some(41));
        assert_eq!(rt.tick(41), 42);
    }

    #[test]
    fn shutdown_clears_the_line() {
        let mut rt = runtime();
        rt.handle(lyric("Hello", None), 0);
        rt.handle(Event::Shutdown, 10);
        assert!(!rt.is_ticking());
        assert!(rt.is_settled());
        assert_eq!(rt.engine().display(), "");
    }
}
