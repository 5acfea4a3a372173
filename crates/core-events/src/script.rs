//! Timed event scripts.
//!
//! One event per line, `#` starts a comment, blank lines are skipped:
//!
//! ```text
//! 0      play
//! 0      meta com.miui.player|Night Flight|Artist - Song|215000
//! 1200   lyric com.miui.player|first line of the song
//! 1500   progress 1500 215000
//! 4000   pause
//! 9000   stop
//! ```
//!
//! Timestamps are milliseconds from the start of the script and must not
//! decrease. Fields after `lyric` and `meta` are separated by `|`; the lyric
//! text itself may contain further `|` characters.

use thiserror::Error;

use crate::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub at_ms: u64,
    pub event: Event,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },
    #[error("line {line}: missing event kind")]
    MissingKind { line: usize },
    #[error("line {line}: unknown event kind {kind:?}")]
    UnknownKind { line: usize, kind: String },
    #[error("line {line}: {kind} is missing field {field}")]
    MissingField {
        line: usize,
        kind: &'static str,
        field: &'static str,
    },
    #[error("line {line}: {field} is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: timestamp {at_ms} is earlier than the previous event ({previous_ms})")]
    OutOfOrder {
        line: usize,
        at_ms: u64,
        previous_ms: u64,
    },
}

impl ScriptError {
    /// One-based line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::InvalidTimestamp { line, .. }
            | ScriptError::MissingKind { line }
            | ScriptError::UnknownKind { line, .. }
            | ScriptError::MissingField { line, .. }
            | ScriptError::InvalidNumber { line, .. }
            | ScriptError::OutOfOrder { line, .. } => *line,
        }
    }
}

/// Parse a whole script. Fails on the first malformed line.
pub fn parse_script(input: &str) -> Result<Vec<TimedEvent>, ScriptError> {
    let mut out = Vec::new();
    let mut previous_ms = 0u64;
    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let Some(timed) = parse_line(line, raw)? else {
            continue;
        };
        if timed.at_ms < previous_ms {
            return Err(ScriptError::OutOfOrder {
                line,
                at_ms: timed.at_ms,
                previous_ms,
            });
        }
        previous_ms = timed.at_ms;
        out.push(timed);
    }
    Ok(out)
}

/// Parse one script line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: usize, raw: &str) -> Result<Option<TimedEvent>, ScriptError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (stamp, rest) = split_word(trimmed);
    let at_ms = stamp
        .parse::<u64>()
        .map_err(|_| ScriptError::InvalidTimestamp {
            line,
            value: stamp.to_string(),
        })?;
    let (kind, args) = split_word(rest);
    if kind.is_empty() {
        return Err(ScriptError::MissingKind { line });
    }

    let event = match kind {
        "lyric" => {
            let (app, text) = args.split_once('|').ok_or(ScriptError::MissingField {
                line,
                kind: "lyric",
                field: "text",
            })?;
            Event::Lyric {
                text: text.to_string(),
                source_app: non_empty(app),
            }
        }
        "meta" => parse_meta(line, args)?,
        "progress" => {
            let (pos, dur) = split_word(args);
            if pos.is_empty() {
                return Err(ScriptError::MissingField {
                    line,
                    kind: "progress",
                    field: "position",
                });
            }
            if dur.is_empty() {
                return Err(ScriptError::MissingField {
                    line,
                    kind: "progress",
                    field: "duration",
                });
            }
            Event::Progress {
                position_ms: number(line, "position", pos)?,
                duration_ms: number(line, "duration", dur)?,
            }
        }
        "play" => Event::Playback { playing: true },
        "pause" => Event::Playback { playing: false },
        "stop" => Event::Shutdown,
        other => {
            return Err(ScriptError::UnknownKind {
                line,
                kind: other.to_string(),
            });
        }
    };
    Ok(Some(TimedEvent { at_ms, event }))
}

fn parse_meta(line: usize, args: &str) -> Result<Event, ScriptError> {
    let mut fields = args.split('|');
    let package = fields.next().map(str::trim).unwrap_or_default();
    if package.is_empty() {
        return Err(ScriptError::MissingField {
            line,
            kind: "meta",
            field: "package",
        });
    }
    let raw_title = fields.next().and_then(non_empty);
    let raw_artist = fields.next().and_then(non_empty);
    let duration_ms = match fields.next().map(str::trim) {
        Some(d) if !d.is_empty() => Some(number(line, "duration", d)?),
        _ => None,
    };
    Ok(Event::Metadata {
        package: package.to_string(),
        raw_title,
        raw_artist,
        duration_ms,
    })
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim_start()),
        None => (s, ""),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn number(line: usize, field: &'static str, value: &str) -> Result<i64, ScriptError> {
    value.parse::<i64>().map_err(|_| ScriptError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}
